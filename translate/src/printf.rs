//! The `console.log` sub-transpiler: synthesizes a single `printf` call's format string and
//! argument list from the call's (arbitrarily typed) arguments (spec §4.4).
//!
//! Arguments are space-joined the way `console.log` joins them at runtime. A literal string
//! argument contributes its own text directly to the format string (it is known at translation
//! time); anything else contributes a type-driven conversion specifier plus a runtime argument.

use ts2c_ast::{CType, Expr, Primitive};

use crate::transpiler::{c_string_literal, Transpiler};

pub(crate) fn build_call(t: &mut Transpiler, args: &[Expr]) -> String {
    let mut pieces = Vec::with_capacity(args.len());
    let mut runtime_args = Vec::new();
    for arg in args {
        if let Expr::StrLit(text) = arg {
            pieces.push(escape_literal_fragment(text));
            continue;
        }
        let ty = t.ctype_of_expr(arg);
        let text = t.transpile_expr(arg);
        let (fragment, extra) = format_for(t, &ty, &text);
        pieces.push(fragment);
        runtime_args.extend(extra);
    }
    let format = pieces.join(" ");
    let format_literal = c_string_literal(&format!("{format}\n"));
    if runtime_args.is_empty() {
        format!("printf({format_literal})")
    } else {
        format!("printf({format_literal}, {})", runtime_args.join(", "))
    }
}

/// Returns the format fragment for one value plus the runtime arguments (zero or more) it
/// contributes, recursing into struct fields and fixed-size array elements.
fn format_for(t: &mut Transpiler, ty: &CType, text: &str) -> (String, Vec<String>) {
    match ty {
        CType::Primitive(Primitive::Int16) => ("%d".to_string(), vec![text.to_string()]),
        CType::Primitive(Primitive::Bool) => ("%d".to_string(), vec![text.to_string()]),
        CType::Primitive(Primitive::CharPtr) => ("%s".to_string(), vec![text.to_string()]),
        CType::Primitive(Primitive::VoidPtr) => ("%p".to_string(), vec![text.to_string()]),
        CType::Pointer(inner) => format_for(t, inner, text),
        CType::Struct(id) => {
            let fields = t.types.structs().get(*id).fields.clone();
            let mut parts = Vec::with_capacity(fields.len());
            let mut args = Vec::new();
            for (name, field_ty) in &fields {
                let field_text = format!("{text}->{name}");
                let (frag, extra) = format_for(t, field_ty, &field_text);
                parts.push(format!("{name}: {frag}"));
                args.extend(extra);
            }
            (format!("{{ {} }}", parts.join(", ")), args)
        }
        // A compile-time-known element count lets the format string be fully unrolled.
        CType::Array(element, capacity, false) => {
            let mut parts = Vec::with_capacity(*capacity);
            let mut args = Vec::new();
            for index in 0..*capacity {
                let element_text = format!("{text}[{index}]");
                let (frag, extra) = format_for(t, element, &element_text);
                parts.push(frag);
                args.extend(extra);
            }
            (format!("[{}]", parts.join(", ")), args)
        }
        // A dynamic array's length is a runtime quantity; printf's format string can't vary by
        // value, so content rendering is out of scope and only the element count is reported.
        CType::Array(_, _, true) => ("[array of %d elements]".to_string(), vec![format!("{text}.size")]),
    }
}

fn escape_literal_fragment(text: &str) -> String {
    text.replace('%', "%%")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ts2c_ast::{Expr, LetBinding, Program, SourceType, Stmt};
    use ts2c_core::Config;

    fn config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    fn console_log(arg: Expr) -> Stmt {
        Stmt::Expr(Expr::Call {
            callee: Box::new(Expr::Member {
                object: Box::new(Expr::Ident("console".to_string())),
                property: "log".to_string(),
            }),
            args: vec![arg],
        })
    }

    #[test]
    fn a_struct_argument_renders_field_by_field() {
        let program = Program {
            functions: vec![],
            main: vec![
                Stmt::Let(LetBinding {
                    name: "p".to_string(),
                    declared_type: Some(SourceType::Object {
                        fields: vec![
                            ("x".to_string(), SourceType::Number),
                            ("y".to_string(), SourceType::Number),
                        ],
                    }),
                    init: Some(Expr::ObjectLit(vec![
                        ("x".to_string(), Expr::IntLit(1)),
                        ("y".to_string(), Expr::IntLit(2)),
                    ])),
                }),
                console_log(Expr::Ident("p".to_string())),
            ],
        };
        let out = crate::transpile(&program, config()).unwrap();
        assert!(
            out.contains("printf(\"{ x: %d, y: %d }\\n\", p->x, p->y);"),
            "{out}"
        );
    }

    #[test]
    fn a_fixed_size_array_argument_fully_unrolls() {
        let program = Program {
            functions: vec![],
            main: vec![
                Stmt::Let(LetBinding {
                    name: "a".to_string(),
                    declared_type: Some(SourceType::Array {
                        element: Box::new(SourceType::Number),
                        capacity: Some(3),
                        fixed: true,
                    }),
                    init: None,
                }),
                console_log(Expr::Ident("a".to_string())),
            ],
        };
        let out = crate::transpile(&program, config()).unwrap();
        assert!(
            out.contains("printf(\"[%d, %d, %d]\\n\", a[0], a[1], a[2]);"),
            "{out}"
        );
    }

    #[test]
    fn a_dynamic_array_argument_only_reports_its_runtime_size() {
        let program = Program {
            functions: vec![],
            main: vec![
                Stmt::Let(LetBinding {
                    name: "a".to_string(),
                    declared_type: None,
                    init: Some(Expr::ArrayLit(vec![Expr::IntLit(1), Expr::IntLit(2)])),
                }),
                console_log(Expr::Ident("a".to_string())),
            ],
        };
        let out = crate::transpile(&program, config()).unwrap();
        assert!(
            out.contains("printf(\"[array of %d elements]\\n\", a.size);"),
            "{out}"
        );
    }
}
