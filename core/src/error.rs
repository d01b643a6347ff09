//! The translator's closed error taxonomy (spec §7). Errors are accumulated by
//! [`crate::diagnostics::Diagnostics`], never thrown.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranspileError {
    /// An AST kind the Transpiler has no dispatch arm for.
    #[error("unsupported AST node: {kind}")]
    UnsupportedNode { kind: String },

    /// A binary/unary/postfix operator outside the supported table.
    #[error("unsupported operator: {op}")]
    UnsupportedOperator { op: String },

    /// Assignment-in-expression, for-in, a non-identifier for-of iterand, or a non-assignable
    /// left-hand side in an object/array-literal assignment.
    #[error("{0}")]
    UnsupportedConstruct(String),

    /// Raised only at the CLI boundary (reading the input AST, writing the emitted C); never
    /// produced by the pure `transpile` entry point.
    #[error("I/O error: {0}")]
    Io(String),
}

impl TranspileError {
    pub fn unsupported_node(kind: impl Into<String>) -> Self {
        TranspileError::UnsupportedNode { kind: kind.into() }
    }

    pub fn unsupported_operator(op: impl std::fmt::Debug) -> Self {
        TranspileError::UnsupportedOperator {
            op: format!("{op:?}"),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        TranspileError::UnsupportedConstruct(message.into())
    }
}
