//! Structural validation of parsed plugins.
//!
//! Responsibilities:
//! - Enforce call placement: a capability call may only be the entire value
//!   of a binding, its argument must be call-free, and the score expression
//!   must be call-free.
//! - Produce the validated `Program` form consumed by the engine, in which
//!   a misplaced call is unrepresentable.

use serde::{Deserialize, Serialize};

use crate::ast::{BindingAst, Expression, ProgramAst};
use crate::error::CompileError;
use crate::parser::parse_program;

/// A compiled plugin: ordered rounds of bindings plus one score expression.
/// Immutable once built; compilation is a pure function of the source text.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub rounds: Vec<Round>,
    pub score: Expression,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub bindings: Vec<Binding>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub name: String,
    pub value: BindingValue,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingValue {
    /// A call-free expression, evaluated when the binding is walked.
    Expr(Expression),
    /// A capability call as the whole binding value. The argument is
    /// call-free.
    Call {
        capability: String,
        argument: Expression,
    },
}

/// Parse and validate plugin source into a `Program`.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    let ast = parse_program(source)?;
    validate(ast)
}

/// Validate a parsed plugin. Round indices in errors are zero-based.
pub fn validate(ast: ProgramAst) -> Result<Program, CompileError> {
    let ProgramAst { rounds, score } = ast;
    if find_call(&score).is_some() {
        return Err(CompileError::CallInScore);
    }
    let rounds = rounds
        .into_iter()
        .enumerate()
        .map(|(round_index, round)| {
            let bindings = round
                .bindings
                .into_iter()
                .map(|binding| validate_binding(round_index, binding))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Round { bindings })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;
    Ok(Program { rounds, score })
}

fn validate_binding(round: usize, binding: BindingAst) -> Result<Binding, CompileError> {
    let BindingAst { name, value } = binding;
    match value {
        Expression::Call(call) => {
            if find_call(&call.argument).is_some() {
                return Err(CompileError::NestedCall {
                    round,
                    binding: name,
                    capability: call.capability,
                });
            }
            Ok(Binding {
                name,
                value: BindingValue::Call {
                    capability: call.capability,
                    argument: *call.argument,
                },
            })
        }
        value => {
            if find_call(&value).is_some() {
                return Err(CompileError::MisplacedCall {
                    round,
                    binding: name,
                });
            }
            Ok(Binding {
                name,
                value: BindingValue::Expr(value),
            })
        }
    }
}

/// First capability call anywhere in the expression, by name. Exhaustive
/// over `Expression` so a new node kind forces a placement decision here.
fn find_call(expr: &Expression) -> Option<&str> {
    match expr {
        Expression::Call(call) => Some(&call.capability),
        Expression::Literal(_) | Expression::Identifier(_) => None,
        Expression::Array(items) => items.iter().find_map(find_call),
        Expression::Object(entries) => entries.iter().find_map(|(_, value)| find_call(value)),
        Expression::Unary(unary) => find_call(&unary.operand),
        Expression::Binary(binary) => {
            find_call(&binary.left).or_else(|| find_call(&binary.right))
        }
        Expression::If(if_expr) => find_call(&if_expr.condition)
            .or_else(|| find_call(&if_expr.then_branch))
            .or_else(|| find_call(&if_expr.else_branch)),
        Expression::Let(let_expr) => {
            find_call(&let_expr.value).or_else(|| find_call(&let_expr.body))
        }
        Expression::Field(field) => find_call(&field.object),
        Expression::Index(index) => {
            find_call(&index.object).or_else(|| find_call(&index.index))
        }
    }
}
