//! Engine error types.
//!
//! Responsibilities:
//! - Distinguish fatal plugin failures (compile errors, policy violations,
//!   deadline overruns, evaluation errors) from per-request failures that
//!   the executor absorbs into `Null`
//! - Carry enough context for result records and logs without exposing
//!   handler internals to plugin authors

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown capability `{0}`")]
    UnknownCapability(String),

    #[error("capability `{0}` is disabled")]
    CapabilityDisabled(String),

    #[error("capability `{name}` timed out after {timeout_ms} ms")]
    CapabilityTimeout { name: String, timeout_ms: u64 },

    #[error("invalid argument for `{capability}`: {message}")]
    InvalidArgument { capability: String, message: String },

    #[error("handler failure: {0}")]
    Handler(String),

    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("plugin exceeded its {0} ms deadline")]
    PluginTimeout(u64),

    #[error("compile error: {0}")]
    Compile(#[from] tsl::CompileError),

    #[error("evaluation error: {0}")]
    Eval(#[from] tsl::EvalError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_argument(capability: &str, message: impl Into<String>) -> Self {
        EngineError::InvalidArgument {
            capability: capability.to_string(),
            message: message.into(),
        }
    }
}
