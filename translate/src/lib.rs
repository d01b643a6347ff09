//! Orchestrates the translation pipeline this workspace exists to run: reconstruct types, run
//! escape analysis, walk the AST emitting C89, then fold every recorded diagnostic into a single
//! result. Exposed as a library so the `ts2c` binary and the integration tests share one entry
//! point (spec §4, §7).

pub mod cli;
mod printf;
mod transpiler;

use std::sync::Arc;

use ts2c_ast::{AnnotatedOracle, Program};
use ts2c_core::{Config, Emitter, MemoryManager, TypeHelper};

use transpiler::Transpiler;

/// Runs the full pipeline over `program` and returns the emitted C89 translation unit, or every
/// unsupported-construct message joined by newlines if anything in the AST fell outside the
/// supported subset.
pub fn transpile(program: &Program, config: Arc<Config>) -> Result<String, String> {
    let oracle = AnnotatedOracle;
    let mut types = TypeHelper::new(&oracle);
    types.figure_out_variables_and_types(program);

    let mut mm = MemoryManager::new();
    mm.preprocess(program, &mut types);

    let mut emitter = Emitter::with_indent_width(config.indent_width);
    // Dynamic-array typedefs first: a struct field of array type embeds the array struct by
    // value, so its definition must already be complete when the struct typedef is emitted.
    emit_dynamic_array_typedefs(&types, &mut emitter);
    emit_struct_typedefs(&types, &mut emitter);

    let mut transpiler = Transpiler::new(&mut types, &mm, &mut emitter);
    for func in &program.functions {
        transpiler.transpile_function(func);
    }
    transpiler.transpile_main(&program.main);
    let diagnostics = transpiler.into_diagnostics();

    diagnostics.into_result(emitter.finalize())
}

fn emit_struct_typedefs(types: &TypeHelper, emitter: &mut Emitter) {
    for def in types.structs().iter() {
        emitter.emit(&format!("struct {} {{\n", def.name), ts2c_core::Target::Globals);
        for (name, ty) in &def.fields {
            let decl = ty.type_string(types.structs()).with_var(name);
            emitter.emit(&format!("    {decl};\n"), ts2c_core::Target::Globals);
        }
        emitter.emit("};\n\n", ts2c_core::Target::Globals);
    }
}

/// Every distinct element-type shape behind a dynamic array gets one `{data,size,capacity}`
/// typedef, named deterministically by `ts2c_ast::dynamic_array_type_name` so repeated uses of
/// the same element type share the declaration.
fn emit_dynamic_array_typedefs(types: &TypeHelper, emitter: &mut Emitter) {
    use std::collections::BTreeSet;
    use ts2c_ast::{CType, dynamic_array_type_name};

    let mut seen_typedefs = BTreeSet::new();
    let mut seen_structs = BTreeSet::new();
    let mut stack: Vec<CType> = types.variables().map(|info| info.ty.clone()).collect();
    for def in types.structs().iter() {
        stack.extend(def.fields.iter().map(|(_, ty)| ty.clone()));
    }

    while let Some(ty) = stack.pop() {
        match &ty {
            CType::Array(element, _, true) => {
                let name = dynamic_array_type_name(element, types.structs());
                if seen_typedefs.insert(name.clone()) {
                    let data_decl = CType::Pointer(element.clone())
                        .type_string(types.structs())
                        .with_var("data");
                    emitter.emit(
                        &format!(
                            "struct {name} {{\n    {data_decl};\n    int16_t size;\n    int16_t capacity;\n}};\n\n"
                        ),
                        ts2c_core::Target::Globals,
                    );
                }
                stack.push((**element).clone());
            }
            CType::Array(element, _, false) => stack.push((**element).clone()),
            CType::Pointer(inner) => stack.push((**inner).clone()),
            CType::Struct(id) => {
                if seen_structs.insert(*id) {
                    for (_, field_ty) in &types.structs().get(*id).fields {
                        stack.push(field_ty.clone());
                    }
                }
            }
            CType::Primitive(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts2c_ast::{BinOp, Expr, Function, LetBinding, SourceType, Stmt};

    fn config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    #[test]
    fn array_length_reads_the_runtime_size_field() {
        // §8 scenario E1.
        let program = Program {
            functions: vec![],
            main: vec![
                Stmt::Let(LetBinding {
                    name: "a".to_string(),
                    declared_type: None,
                    init: Some(Expr::ArrayLit(vec![
                        Expr::IntLit(1),
                        Expr::IntLit(2),
                        Expr::IntLit(3),
                    ])),
                }),
                Stmt::Let(LetBinding {
                    name: "n".to_string(),
                    declared_type: None,
                    init: Some(Expr::Member {
                        object: Box::new(Expr::Ident("a".to_string())),
                        property: "length".to_string(),
                    }),
                }),
            ],
        };
        let out = transpile(&program, config()).unwrap();
        assert!(out.contains("ARRAY_CREATE(a, 6, 3)"), "{out}");
        assert!(out.contains("n = a.size;"), "{out}");
    }

    #[test]
    fn assignment_inside_a_condition_is_rejected() {
        // §8 scenario E6.
        let program = Program {
            functions: vec![],
            main: vec![Stmt::If {
                cond: Expr::Binary {
                    op: BinOp::Assign,
                    left: Box::new(Expr::Ident("o".to_string())),
                    right: Box::new(Expr::ObjectLit(vec![("a".to_string(), Expr::IntLit(1))])),
                },
                then_branch: Box::new(Stmt::Block(vec![])),
                else_branch: None,
            }],
        };
        let err = transpile(&program, config()).unwrap_err();
        assert!(err.contains("Assignments inside expressions"), "{err}");
    }

    #[test]
    fn a_struct_literal_allocates_and_assigns_each_field() {
        let program = Program {
            functions: vec![],
            main: vec![Stmt::Let(LetBinding {
                name: "p".to_string(),
                declared_type: Some(SourceType::Object {
                    fields: vec![("x".to_string(), SourceType::Number)],
                }),
                init: Some(Expr::ObjectLit(vec![("x".to_string(), Expr::IntLit(1))])),
            })],
        };
        let out = transpile(&program, config()).unwrap();
        assert!(out.contains("p = malloc(sizeof(*p));"), "{out}");
        assert!(out.contains("assert(p != NULL);"), "{out}");
        assert!(out.contains("p->x = 1;"), "{out}");
    }
}
