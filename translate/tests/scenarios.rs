//! End-to-end scenarios, hand-built as `Program` values since no front end lives in this
//! workspace. Each test corresponds to one row of the scenario table in the specification.

use std::sync::Arc;

use ts2c_ast::{BinOp, Expr, Function, LetBinding, Program, SourceType, Stmt};
use ts2c_core::Config;
use ts2c_transpile::transpile;

fn run(program: &Program) -> String {
    transpile(program, Arc::new(Config::default())).expect("translation should succeed")
}

fn let_stmt(name: &str, init: Expr) -> Stmt {
    Stmt::Let(LetBinding {
        name: name.to_string(),
        declared_type: None,
        init: Some(init),
    })
}

/// E1: `let a = [1,2,3]; console.log(a.length);` — even a fully-literal array goes through
/// `ARRAY_CREATE`, never a raw fixed C array.
#[test]
fn e1_array_literal_is_dynamic_and_length_reads_the_size_field() {
    let program = Program {
        functions: vec![],
        main: vec![
            let_stmt(
                "a",
                Expr::ArrayLit(vec![Expr::IntLit(1), Expr::IntLit(2), Expr::IntLit(3)]),
            ),
            Stmt::Expr(Expr::Call {
                callee: Box::new(Expr::Member {
                    object: Box::new(Expr::Ident("console".to_string())),
                    property: "log".to_string(),
                }),
                args: vec![Expr::Member {
                    object: Box::new(Expr::Ident("a".to_string())),
                    property: "length".to_string(),
                }],
            }),
        ],
    };
    let out = run(&program);
    assert!(out.contains("ARRAY_CREATE(a,"), "{out}");
    assert!(out.contains("printf(\"%d\\n\", a.size);"), "{out}");
}

/// E2: `let s = "hi"; if (s == "hi") console.log(s);` — string equality lowers to `strcmp`.
#[test]
fn e2_string_equality_uses_strcmp() {
    let program = Program {
        functions: vec![],
        main: vec![
            let_stmt("s", Expr::StrLit("hi".to_string())),
            Stmt::If {
                cond: Expr::Binary {
                    op: BinOp::Eq,
                    left: Box::new(Expr::Ident("s".to_string())),
                    right: Box::new(Expr::StrLit("hi".to_string())),
                },
                then_branch: Box::new(Stmt::Block(vec![Stmt::Expr(Expr::Call {
                    callee: Box::new(Expr::Member {
                        object: Box::new(Expr::Ident("console".to_string())),
                        property: "log".to_string(),
                    }),
                    args: vec![Expr::Ident("s".to_string())],
                })])),
                else_branch: None,
            },
        ],
    };
    let out = run(&program);
    assert!(out.contains("strcmp(s, \"hi\") == 0"), "{out}");
    assert!(out.contains("#include <string.h>"), "{out}");
}

/// E3: `let p = { x: 1, y: 2 }; return p;` at top scope — one struct typedef, a `malloc`, no
/// local `free` (the value escapes through the global pointer table instead).
#[test]
fn e3_an_escaping_struct_is_malloced_and_never_locally_freed() {
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
            Stmt::Return(Some(Expr::Ident("p".to_string()))),
        ],
    };
    let out = run(&program);
    assert!(out.contains("struct p_0 {"), "{out}");
    assert!(out.contains("malloc(sizeof(*p))"), "{out}");
    assert!(out.contains("ts2c_global_pointers"), "{out}");
    assert!(!out.contains("free(p)"), "{out}");
}

/// E4: `for (let i=0, j=0; i<10; i++) { j = j + i; }` — both loop variables are declared in the
/// prologue, but only the last one appears inside the `for (...)` header.
#[test]
fn e4_multi_binding_for_hoists_all_but_the_last() {
    let program = Program {
        functions: vec![],
        main: vec![Stmt::For {
            init: vec![
                LetBinding {
                    name: "i".to_string(),
                    declared_type: None,
                    init: Some(Expr::IntLit(0)),
                },
                LetBinding {
                    name: "j".to_string(),
                    declared_type: None,
                    init: Some(Expr::IntLit(0)),
                },
            ],
            cond: Some(Expr::Binary {
                op: BinOp::Lt,
                left: Box::new(Expr::Ident("i".to_string())),
                right: Box::new(Expr::IntLit(10)),
            }),
            step: Some(Expr::Postfix {
                op: ts2c_ast::PostfixOp::Inc,
                expr: Box::new(Expr::Ident("i".to_string())),
            }),
            body: Box::new(Stmt::Block(vec![Stmt::Expr(Expr::Binary {
                op: BinOp::Assign,
                left: Box::new(Expr::Ident("j".to_string())),
                right: Box::new(Expr::Binary {
                    op: BinOp::Add,
                    left: Box::new(Expr::Ident("j".to_string())),
                    right: Box::new(Expr::Ident("i".to_string())),
                }),
            })])),
        }],
    };
    let out = run(&program);
    assert!(out.contains("int16_t i;"), "{out}");
    assert!(out.contains("int16_t j;"), "{out}");
    assert!(out.contains("j = 0;"), "{out}");
    assert!(out.contains("for (i = 0; i < 10; i++) {"), "{out}");
}

/// E5: `for (let x of arr) console.log(x);` — a generated iterator counter drives the loop, and
/// the element is copied out of `.data[...]` at the top of each iteration.
#[test]
fn e5_for_of_generates_an_iterator_counter() {
    let program = Program {
        functions: vec![],
        main: vec![
            let_stmt("arr", Expr::ArrayLit(vec![Expr::IntLit(1), Expr::IntLit(2)])),
            Stmt::ForOf {
                binding: "x".to_string(),
                declared_type: None,
                iterand: Expr::Ident("arr".to_string()),
                body: Box::new(Stmt::Block(vec![Stmt::Expr(Expr::Call {
                    callee: Box::new(Expr::Member {
                        object: Box::new(Expr::Ident("console".to_string())),
                        property: "log".to_string(),
                    }),
                    args: vec![Expr::Ident("x".to_string())],
                })])),
            },
        ],
    };
    let out = run(&program);
    assert!(out.contains("iterator_1 = 0"), "{out}");
    assert!(out.contains("iterator_1 < arr.size"), "{out}");
    assert!(out.contains("x = arr.data[iterator_1];"), "{out}");
}

/// E6: an assignment nested inside a condition is rejected outright rather than silently
/// mistranslated.
#[test]
fn e6_assignment_inside_a_condition_is_rejected() {
    let program = Program {
        functions: vec![],
        main: vec![
            Stmt::Let(LetBinding {
                name: "o".to_string(),
                declared_type: Some(SourceType::Object { fields: vec![] }),
                init: Some(Expr::ObjectLit(vec![])),
            }),
            Stmt::If {
                cond: Expr::Binary {
                    op: BinOp::Assign,
                    left: Box::new(Expr::Ident("o".to_string())),
                    right: Box::new(Expr::ObjectLit(vec![("a".to_string(), Expr::IntLit(1))])),
                },
                then_branch: Box::new(Stmt::Block(vec![])),
                else_branch: None,
            },
        ],
    };
    let err = transpile(&program, Arc::new(Config::default())).unwrap_err();
    assert!(
        err.contains("Assignments inside expressions are not yet supported."),
        "{err}"
    );
}

/// `console.log` joins a literal-string fragment and a struct argument the way the runtime
/// `console.log` joins its arguments with a space, recursing into the struct's own fields.
#[test]
fn console_log_joins_a_literal_fragment_with_a_recursively_rendered_struct() {
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
            Stmt::Expr(Expr::Call {
                callee: Box::new(Expr::Member {
                    object: Box::new(Expr::Ident("console".to_string())),
                    property: "log".to_string(),
                }),
                args: vec![
                    Expr::StrLit("point".to_string()),
                    Expr::Ident("p".to_string()),
                ],
            }),
        ],
    };
    let out = run(&program);
    assert!(
        out.contains("printf(\"point { x: %d, y: %d }\\n\", p->x, p->y);"),
        "{out}"
    );
}

/// A non-escaping local array of structs frees each element before freeing its own backing
/// buffer (§4.2: elements are freed before the array's `data` buffer).
#[test]
fn a_non_escaping_array_of_structs_frees_every_element_before_its_backing_buffer() {
    let program = Program {
        functions: vec![Function {
            name: "make".to_string(),
            params: vec![],
            declared_return: None,
            body: vec![Stmt::Let(LetBinding {
                name: "arr".to_string(),
                declared_type: None,
                init: Some(Expr::ArrayLit(vec![
                    Expr::ObjectLit(vec![("x".to_string(), Expr::IntLit(1))]),
                    Expr::ObjectLit(vec![("x".to_string(), Expr::IntLit(2))]),
                ])),
            })],
        }],
        main: vec![],
    };
    let out = run(&program);
    let loop_pos = out
        .find("for (iterator_1 = 0; iterator_1 < arr.size; iterator_1++) {")
        .expect(&out);
    let element_free_pos = out.find("free(arr.data[iterator_1]);").expect(&out);
    let buffer_free_pos = out.find("free(arr.data);").expect(&out);
    assert!(loop_pos < element_free_pos, "{out}");
    assert!(element_free_pos < buffer_free_pos, "{out}");
}

/// For-in is explicitly out of scope (§1 non-goals); it must be reported, not silently dropped.
#[test]
fn for_in_is_reported_as_unsupported() {
    let program = Program {
        functions: vec![],
        main: vec![Stmt::ForIn {
            binding: "k".to_string(),
            iterand: Expr::Ident("obj".to_string()),
            body: Box::new(Stmt::Block(vec![])),
        }],
    };
    let err = transpile(&program, Arc::new(Config::default())).unwrap_err();
    assert!(err.contains("for-in"), "{err}");
}
