//! Error types for TSL parsing, validation, and evaluation.
//!
//! Responsibilities:
//! - Carry source positions out of the pest parser.
//! - Report call-placement violations with round and binding context.
//! - Describe plan-time evaluation failures precisely enough for plugin
//!   authors to act on them.

use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

/// Error produced while turning source text into an AST.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Error produced by the structural pass that turns a parsed plugin into a
/// `Program`. Round indices are zero-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("round {round}, binding `{binding}`: capability call nested inside the argument of `{capability}`")]
    NestedCall {
        round: usize,
        binding: String,
        capability: String,
    },
    #[error("round {round}, binding `{binding}`: capability call must be the entire value of the binding")]
    MisplacedCall { round: usize, binding: String },
    #[error("score expression must not contain capability calls")]
    CallInScore,
}

/// Error raised during plan-time evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined name `{0}`")]
    UndefinedName(String),
    #[error("type error in {operation}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        operation: String,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {0}")]
    IntegerOverflow(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl EvalError {
    pub fn type_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        EvalError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            operation: operation.into(),
        }
    }
}
