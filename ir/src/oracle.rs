//! The type-checker oracle named as an external collaborator in the specification (§6).
//!
//! `TypeHelper` only consults the oracle when a node carries no inline type annotation of its
//! own; most of the supported subset is annotated directly on the AST by the front end, so the
//! default [`AnnotatedOracle`] deliberately answers nothing new.

use crate::ctype::SourceType;

/// The minimum a type-checker oracle must answer for `TypeHelper` to reconstruct C types.
pub trait TypeOracle {
    /// Resolves a named identifier, in the given scope, to its declared source type.
    fn type_of_ident(&self, scope: &str, name: &str) -> Option<SourceType>;

    /// Resolves a call target's name to its declared return type.
    fn return_type_of(&self, callee: &str) -> Option<SourceType>;

    /// Resolves `object.prop` given `object`'s already-known source type.
    fn type_of_member(&self, object: &SourceType, prop: &str) -> Option<SourceType>;
}

/// An oracle that answers purely from the structural information already present on the AST
/// (object field lists) and otherwise defers to whatever inline annotation, if any, is already
/// attached to the node being resolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotatedOracle;

impl TypeOracle for AnnotatedOracle {
    fn type_of_ident(&self, _scope: &str, _name: &str) -> Option<SourceType> {
        None
    }

    fn return_type_of(&self, _callee: &str) -> Option<SourceType> {
        None
    }

    fn type_of_member(&self, object: &SourceType, prop: &str) -> Option<SourceType> {
        match object {
            SourceType::Object { fields } => fields
                .iter()
                .find(|(name, _)| name == prop)
                .map(|(_, ty)| ty.clone()),
            _ => None,
        }
    }
}
