// TSL runtime: values, environments, and the plan-time evaluator.

pub mod environment;
pub mod evaluator;
pub mod values;

pub use environment::Environment;
pub use evaluator::Evaluator;
pub use values::Value;
