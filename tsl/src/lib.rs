// TSL - Trust Scoring Language
// A small, total expression language for staged trust-scoring plugins:
// rounds of bindings (optionally capability calls) followed by one pure
// score expression. The engine that provisions capability calls lives in
// the `trustnet` crate; this crate owns parsing, validation, values, and
// plan-time evaluation.

pub mod ast;
pub mod error;
pub mod parser;
pub mod runtime;
pub mod validator;

// Re-export the key components so callers don't need to know module paths.
pub use error::{CompileError, EvalError, EvalResult, ParseError};
pub use parser::{parse_expression, parse_program};
pub use runtime::environment::Environment;
pub use runtime::evaluator::Evaluator;
pub use runtime::values::Value;
pub use validator::{compile, Binding, BindingValue, Program, Round};
