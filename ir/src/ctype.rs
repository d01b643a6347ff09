//! The reconstructed C-level type model.
//!
//! [`SourceType`] is what a type-checker oracle (or an inline annotation) gives us about the
//! input language; [`CType`] is what `TypeHelper::convert_type` turns it into, per the mapping
//! table in the specification's §4.1.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A type as reconstructed (or annotated) in the source language, before conversion to a
/// concrete C representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceType {
    Number,
    Boolean,
    String,
    Array {
        element: Box<SourceType>,
        /// A statically known bound (literal initializer length, a provable `push`-count upper
        /// bound, or a declared capacity), used to size the `ARRAY_CREATE` call. `None` means no
        /// bound could be established.
        capacity: Option<usize>,
        /// True only for an explicit type annotation giving a fixed capacity; such arrays are
        /// emitted as raw C arrays rather than the `{data,size,capacity}` layout. Array literals
        /// and push-count-bounded inference always leave this false (§8 scenario E1: even
        /// `[1, 2, 3]` goes through `ARRAY_CREATE`).
        fixed: bool,
    },
    /// Field order is canonical: two object types are the same struct iff their field lists
    /// agree in both name, type, and order.
    Object {
        fields: Vec<(String, SourceType)>,
    },
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int16,
    CharPtr,
    Bool,
    VoidPtr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub u32);

#[derive(Debug, Clone)]
pub struct StructDef {
    pub id: StructId,
    pub name: String,
    pub fields: Vec<(String, CType)>,
}

/// The semantic C type assigned to a variable or expression (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum CType {
    Primitive(Primitive),
    /// Struct-typed values are always heap-allocated and referenced through this id rather than
    /// embedding their field list, so that two equivalently-shaped object literals intern to the
    /// same [`StructDef`] and are emitted as a single typedef.
    Struct(StructId),
    /// `element`, logical `capacity`, and whether the array is dynamic (`{data,size,capacity}`)
    /// or a raw fixed-size C array.
    Array(Box<CType>, usize, bool),
    Pointer(Box<CType>),
}

impl CType {
    pub fn is_allocated(&self) -> bool {
        matches!(self, CType::Struct(_) | CType::Array(..))
    }

    pub fn is_dynamic_array(&self) -> bool {
        matches!(self, CType::Array(_, _, true))
    }

    /// The formatted type, per §3: either a bare prefix (caller appends the variable name) or a
    /// declarator template containing the `{var}` placeholder (C array declarators, where the
    /// name sits inside the brackets: `int16_t name[4]`).
    pub fn type_string(&self, structs: &StructRegistry) -> TypeString {
        match self {
            CType::Primitive(Primitive::Int16) => TypeString::Prefix("int16_t ".to_string()),
            CType::Primitive(Primitive::CharPtr) => TypeString::Prefix("char *".to_string()),
            CType::Primitive(Primitive::Bool) => TypeString::Prefix("uint8_t ".to_string()),
            CType::Primitive(Primitive::VoidPtr) => TypeString::Prefix("void *".to_string()),
            CType::Struct(id) => {
                TypeString::Prefix(format!("struct {} *", structs.get(*id).name))
            }
            CType::Pointer(inner) => {
                TypeString::Prefix(format!("{}*", inner.type_string(structs).into_text()))
            }
            CType::Array(element, capacity, dynamic) => {
                if *dynamic {
                    TypeString::Prefix(format!(
                        "struct {} ",
                        dynamic_array_type_name(element, structs)
                    ))
                } else {
                    let elem_prefix = element.type_string(structs).into_text();
                    TypeString::Declarator(format!("{elem_prefix}{{var}}[{capacity}]"))
                }
            }
        }
    }
}

/// The name given to the generated `{data,size,capacity}` typedef for dynamic arrays of a given
/// element type. Deterministic so that the same element type always resolves to the same name,
/// which is how the emitter's header-style dedup keeps the typedef to a single definition.
pub fn dynamic_array_type_name(element: &CType, structs: &StructRegistry) -> String {
    format!("array_{}", element_slug(element, structs))
}

fn element_slug(ty: &CType, structs: &StructRegistry) -> String {
    match ty {
        CType::Primitive(Primitive::Int16) => "int16_t".to_string(),
        CType::Primitive(Primitive::CharPtr) => "char_p".to_string(),
        CType::Primitive(Primitive::Bool) => "uint8_t".to_string(),
        CType::Primitive(Primitive::VoidPtr) => "void_p".to_string(),
        CType::Struct(id) => structs.get(*id).name.clone(),
        CType::Pointer(inner) => format!("p_{}", element_slug(inner, structs)),
        CType::Array(element, capacity, dynamic) => {
            if *dynamic {
                format!("dyn_{}", element_slug(element, structs))
            } else {
                format!("fixed_{}_{}", element_slug(element, structs), capacity)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeString {
    /// e.g. `"int16_t "`; the caller appends the variable name directly.
    Prefix(String),
    /// e.g. `"int16_t {var}[4]"`; the caller substitutes `{var}` for the variable name.
    Declarator(String),
}

impl TypeString {
    /// Renders the declaration for `var`, substituting the `{var}` placeholder if present.
    pub fn with_var(&self, var: &str) -> String {
        match self {
            TypeString::Prefix(p) => format!("{p}{var}"),
            TypeString::Declarator(d) => d.replace("{var}", var),
        }
    }

    /// The raw formatted text, used when this type string is itself embedded as a prefix of a
    /// larger type (e.g. the element type of a pointer or array).
    fn into_text(&self) -> String {
        match self {
            TypeString::Prefix(p) => p.clone(),
            TypeString::Declarator(d) => d.clone(),
        }
    }
}

/// Interns struct layouts by their canonical field signature so that equivalently-shaped object
/// literals share a single emitted typedef (§4.1).
#[derive(Debug, Default)]
pub struct StructRegistry {
    defs: Vec<StructDef>,
    by_signature: HashMap<String, StructId>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: StructId) -> &StructDef {
        &self.defs[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructDef> {
        self.defs.iter()
    }

    /// Returns the id of the struct already carrying this field signature, or registers a new
    /// one named from `name_hint`.
    pub fn intern(&mut self, name_hint: &str, fields: Vec<(String, CType)>) -> StructId {
        let signature = Self::signature(&fields);
        if let Some(id) = self.by_signature.get(&signature) {
            return *id;
        }
        let id = StructId(self.defs.len() as u32);
        let name = format!("{name_hint}_{}", id.0);
        self.defs.push(StructDef {
            id,
            name,
            fields,
        });
        self.by_signature.insert(signature, id);
        id
    }

    fn signature(fields: &[(String, CType)]) -> String {
        fields
            .iter()
            .map(|(name, ty)| format!("{name}:{ty:?}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// The enclosing scope (function name, or `"main"` for the top-level script body) a binding was
/// declared in. Doubles as the key under which `VariableInfo` is registered, since the source
/// language scopes `let` bindings to the function, not the block.
pub type Scope = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarKey {
    pub scope: Scope,
    pub name: String,
}

impl VarKey {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        VarKey {
            scope: scope.into(),
            name: name.into(),
        }
    }
}

/// Everything recorded about one named binding (§3).
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub key: VarKey,
    pub ty: CType,
    pub requires_allocation: bool,
    pub is_dynamic_array: bool,
    pub escapes: bool,
}

impl VariableInfo {
    pub fn new(key: VarKey, ty: CType) -> Self {
        let requires_allocation = ty.is_allocated();
        let is_dynamic_array = ty.is_dynamic_array();
        VariableInfo {
            key,
            ty,
            requires_allocation,
            is_dynamic_array,
            escapes: false,
        }
    }
}
