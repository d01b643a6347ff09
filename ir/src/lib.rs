//! The AST vocabulary shared by every crate in this workspace.
//!
//! This crate owns no behavior beyond constructors and formatting. It defines:
//! - the already-parsed input-language tree ([`node`]) that the (external) front end hands to
//!   the translator,
//! - the reconstructed C-level type model ([`ctype`]) that `TypeHelper` populates and every
//!   other component reads, and
//! - the [`oracle::TypeOracle`] trait a host environment implements to answer type queries for
//!   nodes that carry no inline annotation.

pub mod ctype;
pub mod node;
pub mod oracle;

pub use ctype::{
    CType, Primitive, Scope, SourceType, StructDef, StructId, StructRegistry, TypeString, VarKey,
    VariableInfo, dynamic_array_type_name,
};
pub use node::{BinOp, Expr, Function, LetBinding, Param, PostfixOp, Program, Stmt, UnaryOp};
pub use oracle::{AnnotatedOracle, TypeOracle};
