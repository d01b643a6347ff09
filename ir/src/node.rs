//! The already-parsed input-language AST.
//!
//! A real front end (parser + type checker) lives outside this workspace; these types are the
//! boundary it hands a compilation unit across. Nothing here carries source spans or line
//! numbers — the translator never needs to map emitted C back to input positions.

use crate::ctype::SourceType;
use serde::{Deserialize, Serialize};

/// One compilation unit: zero or more named function declarations plus the top-level statements
/// that make up the script's implicit entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
    #[serde(default)]
    pub main: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    #[serde(default)]
    pub declared_return: Option<SourceType>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub declared_type: Option<SourceType>,
}

/// A single `let`-style binding, the unit a `for` header's initializer list is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetBinding {
    pub name: String,
    #[serde(default)]
    pub declared_type: Option<SourceType>,
    #[serde(default)]
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    Let(LetBinding),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        #[serde(default)]
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Vec<LetBinding>,
        #[serde(default)]
        cond: Option<Expr>,
        #[serde(default)]
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    ForOf {
        binding: String,
        #[serde(default)]
        declared_type: Option<SourceType>,
        iterand: Expr,
        body: Box<Stmt>,
    },
    ForIn {
        binding: String,
        iterand: Expr,
        body: Box<Stmt>,
    },
    Return(#[serde(default)] Option<Expr>),
    Expr(Expr),
    Break,
    Continue,
}

/// Binary operator tokens as the front end hands them over. The table the spec fixes (§4.4) is
/// only a subset of these; the rest exist so an out-of-subset token (`%`, `&&`, bitwise ops, the
/// compound assignments) can be represented at all and reported as unsupported rather than
/// rejected before it reaches the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Assign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    BitNot,
    TypeOf,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostfixOp {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    Ident(String),
    IntLit(i64),
    /// Already decoded (escape sequences resolved, quote token dropped) by the external lexer;
    /// the translator only re-escapes it when emitting a C string literal.
    StrLit(String),
    BoolLit(bool),
    NullLit,
    ArrayLit(Vec<Expr>),
    /// Field order is preserved; it is the canonical order used for the struct's emitted layout.
    ObjectLit(Vec<(String, Expr)>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Postfix {
        op: PostfixOp,
        expr: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
}
