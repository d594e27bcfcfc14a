// Plan-time evaluator for TSL expressions.
// Pure: no I/O, no clock access, no host state. Capability calls are
// intercepted by the engine before evaluation ever sees them; one reaching
// eval_expr is a compiler defect surfaced as an internal error.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{BinaryExpr, BinaryOp, Expression, FieldExpr, IfExpr, IndexExpr, LetExpr, Literal, UnaryExpr, UnaryOp};
use crate::error::{EvalError, EvalResult};
use crate::runtime::environment::Environment;
use crate::runtime::values::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    pub fn eval_expr(&self, expr: &Expression, env: &Environment) -> EvalResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(self.eval_literal(lit)),
            Expression::Identifier(name) => env
                .lookup(name)
                .ok_or_else(|| EvalError::UndefinedName(name.clone())),
            Expression::Array(exprs) => {
                let values: Result<Vec<Value>, EvalError> =
                    exprs.iter().map(|e| self.eval_expr(e, env)).collect();
                Ok(Value::Array(values?))
            }
            Expression::Object(entries) => {
                // Later duplicate keys overwrite earlier ones.
                let mut result = HashMap::new();
                for (key, value_expr) in entries {
                    let value = self.eval_expr(value_expr, env)?;
                    result.insert(key.clone(), value);
                }
                Ok(Value::Object(result))
            }
            Expression::Unary(unary) => self.eval_unary(unary, env),
            Expression::Binary(binary) => self.eval_binary(binary, env),
            Expression::If(if_expr) => self.eval_if(if_expr, env),
            Expression::Let(let_expr) => self.eval_let(let_expr, env),
            Expression::Field(field) => self.eval_field(field, env),
            Expression::Index(index) => self.eval_index(index, env),
            Expression::Call(call) => Err(EvalError::Internal(format!(
                "capability call `{}` reached the evaluator",
                call.capability
            ))),
        }
    }

    fn eval_literal(&self, lit: &Literal) -> Value {
        match lit {
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Boolean(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
        }
    }

    fn eval_if(&self, if_expr: &IfExpr, env: &Environment) -> EvalResult<Value> {
        let condition = self.eval_expr(&if_expr.condition, env)?;
        if condition.is_truthy() {
            self.eval_expr(&if_expr.then_branch, env)
        } else {
            self.eval_expr(&if_expr.else_branch, env)
        }
    }

    fn eval_let(&self, let_expr: &LetExpr, env: &Environment) -> EvalResult<Value> {
        let value = self.eval_expr(&let_expr.value, env)?;
        let mut child = Environment::with_parent(Arc::new(env.clone()));
        child.define(let_expr.name.clone(), value);
        self.eval_expr(&let_expr.body, &child)
    }

    fn eval_field(&self, field: &FieldExpr, env: &Environment) -> EvalResult<Value> {
        let object = self.eval_expr(&field.object, env)?;
        match object {
            // Null propagates so failed capability results flow through
            // accessors without faulting the plugin.
            Value::Null => Ok(Value::Null),
            Value::Object(entries) => {
                Ok(entries.get(&field.field).cloned().unwrap_or(Value::Null))
            }
            other => Err(EvalError::type_mismatch(
                "object",
                other.type_name(),
                format!("field access `.{}`", field.field),
            )),
        }
    }

    fn eval_index(&self, index: &IndexExpr, env: &Environment) -> EvalResult<Value> {
        let base = self.eval_expr(&index.object, env)?;
        let key = self.eval_expr(&index.index, env)?;
        match (base, key) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Array(items), Value::Integer(i)) => {
                if i < 0 || i as usize >= items.len() {
                    Ok(Value::Null)
                } else {
                    Ok(items[i as usize].clone())
                }
            }
            (Value::Array(_), other) => Err(EvalError::type_mismatch(
                "integer index",
                other.type_name(),
                "array indexing",
            )),
            (Value::Object(entries), Value::String(key)) => {
                Ok(entries.get(&key).cloned().unwrap_or(Value::Null))
            }
            (Value::Object(_), other) => Err(EvalError::type_mismatch(
                "string key",
                other.type_name(),
                "object indexing",
            )),
            (other, _) => Err(EvalError::type_mismatch(
                "array or object",
                other.type_name(),
                "indexing",
            )),
        }
    }

    fn eval_unary(&self, unary: &UnaryExpr, env: &Environment) -> EvalResult<Value> {
        let operand = self.eval_expr(&unary.operand, env)?;
        match unary.op {
            UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
            UnaryOp::Neg => match operand {
                Value::Integer(i) => i
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::IntegerOverflow("negation".to_string())),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(EvalError::type_mismatch(
                    "number",
                    other.type_name(),
                    "negation",
                )),
            },
        }
    }

    fn eval_binary(&self, binary: &BinaryExpr, env: &Environment) -> EvalResult<Value> {
        match binary.op {
            // && and || short-circuit and return the deciding operand, so
            // `x || 0.0` works as a null fallback.
            BinaryOp::And => {
                let left = self.eval_expr(&binary.left, env)?;
                if !left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expr(&binary.right, env)
                }
            }
            BinaryOp::Or => {
                let left = self.eval_expr(&binary.left, env)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expr(&binary.right, env)
                }
            }
            op => {
                let left = self.eval_expr(&binary.left, env)?;
                let right = self.eval_expr(&binary.right, env)?;
                self.apply_binary(op, left, right)
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
        match op {
            BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
            BinaryOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.apply_comparison(op, &left, &right)
            }
            BinaryOp::Add => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => a
                    .checked_add(b)
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::IntegerOverflow("+".to_string())),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (left, right) => match numeric_pair(&left, &right) {
                    Some((a, b)) => Ok(Value::Float(a + b)),
                    None => Err(binary_type_error("two numbers or two strings", &left, &right, op)),
                },
            },
            BinaryOp::Sub => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => a
                    .checked_sub(b)
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::IntegerOverflow("-".to_string())),
                (left, right) => match numeric_pair(&left, &right) {
                    Some((a, b)) => Ok(Value::Float(a - b)),
                    None => Err(binary_type_error("two numbers", &left, &right, op)),
                },
            },
            BinaryOp::Mul => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => a
                    .checked_mul(b)
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::IntegerOverflow("*".to_string())),
                (left, right) => match numeric_pair(&left, &right) {
                    Some((a, b)) => Ok(Value::Float(a * b)),
                    None => Err(binary_type_error("two numbers", &left, &right, op)),
                },
            },
            // Division always yields a float; integer division by zero is an
            // error, float division follows IEEE.
            BinaryOp::Div => match (&left, &right) {
                (Value::Integer(_), Value::Integer(0)) => Err(EvalError::DivisionByZero),
                _ => match numeric_pair(&left, &right) {
                    Some((a, b)) => Ok(Value::Float(a / b)),
                    None => Err(binary_type_error("two numbers", &left, &right, op)),
                },
            },
            BinaryOp::Rem => match (left, right) {
                (Value::Integer(_), Value::Integer(0)) => Err(EvalError::DivisionByZero),
                (Value::Integer(a), Value::Integer(b)) => a
                    .checked_rem(b)
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::IntegerOverflow("%".to_string())),
                (left, right) => match numeric_pair(&left, &right) {
                    Some((a, b)) => Ok(Value::Float(a % b)),
                    None => Err(binary_type_error("two numbers", &left, &right, op)),
                },
            },
            BinaryOp::And | BinaryOp::Or => Err(EvalError::Internal(
                "short-circuit operator in apply_binary".to_string(),
            )),
        }
    }

    fn apply_comparison(&self, op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
        let ordering = match (left, right) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => match numeric_pair(left, right) {
                // partial_cmp is None only when NaN is involved; those
                // comparisons are false rather than errors.
                Some((a, b)) => match a.partial_cmp(&b) {
                    Some(ord) => ord,
                    None => return Ok(Value::Bool(false)),
                },
                None => {
                    return Err(binary_type_error(
                        "two numbers, strings, or timestamps",
                        left,
                        right,
                        op,
                    ))
                }
            },
        };
        let result = match op {
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Le => ordering != Ordering::Greater,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::Ge => ordering != Ordering::Less,
            _ => {
                return Err(EvalError::Internal(
                    "non-comparison operator in apply_comparison".to_string(),
                ))
            }
        };
        Ok(Value::Bool(result))
    }
}

/// Structural equality with numeric promotion: `1 == 1.0` holds, including
/// inside arrays and objects. Values of different kinds are unequal, never
/// an error.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            (*a as f64) == *b
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).map_or(false, |w| values_equal(v, w)))
        }
        _ => left == right,
    }
}

fn numeric_pair(left: &Value, right: &Value) -> Option<(f64, f64)> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Some((a, b)),
        _ => None,
    }
}

fn binary_type_error(expected: &str, left: &Value, right: &Value, op: BinaryOp) -> EvalError {
    EvalError::type_mismatch(
        expected,
        format!("{} and {}", left.type_name(), right.type_name()),
        op.symbol(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn eval(source: &str) -> EvalResult<Value> {
        let expr = parse_expression(source).expect("expression should parse");
        Evaluator::new().eval_expr(&expr, &Environment::new())
    }

    fn eval_in(source: &str, env: &Environment) -> EvalResult<Value> {
        let expr = parse_expression(source).expect("expression should parse");
        Evaluator::new().eval_expr(&expr, env)
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Integer(14));
        assert_eq!(eval("10 % 3").unwrap(), Value::Integer(1));
        assert_eq!(eval("-(2 + 3)").unwrap(), Value::Integer(-5));
    }

    #[test]
    fn division_always_yields_float() {
        assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(eval("4 / 2").unwrap(), Value::Float(2.0));
    }

    #[test]
    fn mixed_arithmetic_widens_to_float() {
        assert_eq!(eval("1 + 0.5").unwrap(), Value::Float(1.5));
        assert_eq!(eval("2 * 1.5").unwrap(), Value::Float(3.0));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            eval("\"ab\" + \"cd\"").unwrap(),
            Value::String("abcd".to_string())
        );
        assert!(matches!(
            eval("\"ab\" + 1"),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn integer_division_by_zero_is_an_error() {
        assert_eq!(eval("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 % 0"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn float_division_follows_ieee() {
        assert_eq!(eval("1.0 / 0.0").unwrap(), Value::Float(f64::INFINITY));
    }

    #[test]
    fn integer_overflow_is_an_error() {
        assert_eq!(
            eval("9223372036854775807 + 1"),
            Err(EvalError::IntegerOverflow("+".to_string()))
        );
    }

    #[test]
    fn equality_promotes_across_numeric_kinds() {
        assert_eq!(eval("1 == 1.0").unwrap(), Value::Bool(true));
        assert_eq!(eval("[1, 2] == [1.0, 2.0]").unwrap(), Value::Bool(true));
        assert_eq!(eval("1 == \"1\"").unwrap(), Value::Bool(false));
        assert_eq!(eval("null == null").unwrap(), Value::Bool(true));
    }

    #[test]
    fn comparisons_cover_numbers_and_strings() {
        assert_eq!(eval("1 < 2").unwrap(), Value::Bool(true));
        assert_eq!(eval("2.5 >= 2.5").unwrap(), Value::Bool(true));
        assert_eq!(eval("\"a\" < \"b\"").unwrap(), Value::Bool(true));
        assert!(matches!(
            eval("1 < \"b\""),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn logic_returns_deciding_operand() {
        assert_eq!(eval("null || 0.5").unwrap(), Value::Float(0.5));
        assert_eq!(eval("false && 1").unwrap(), Value::Bool(false));
        assert_eq!(eval("1 && 2").unwrap(), Value::Integer(2));
        assert_eq!(eval("!null").unwrap(), Value::Bool(true));
    }

    #[test]
    fn short_circuit_skips_right_operand() {
        // The right side would be a type error if evaluated.
        assert_eq!(eval("true || (1 + \"x\")").unwrap(), Value::Bool(true));
        assert_eq!(eval("false && (1 + \"x\")").unwrap(), Value::Bool(false));
    }

    #[test]
    fn field_access_propagates_null() {
        assert_eq!(eval("null.anything").unwrap(), Value::Null);
        assert_eq!(eval("{x: 1}.x").unwrap(), Value::Integer(1));
        assert_eq!(eval("{x: 1}.missing").unwrap(), Value::Null);
        assert!(matches!(
            eval("1.x"),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn index_access_on_arrays_and_objects() {
        assert_eq!(eval("[10, 20][1]").unwrap(), Value::Integer(20));
        assert_eq!(eval("[10, 20][5]").unwrap(), Value::Null);
        assert_eq!(eval("{a: 1}[\"a\"]").unwrap(), Value::Integer(1));
        assert_eq!(eval("null[0]").unwrap(), Value::Null);
    }

    #[test]
    fn let_binds_in_child_scope() {
        assert_eq!(eval("let x = 2 in x * x").unwrap(), Value::Integer(4));
        assert_eq!(
            eval("let x = 1 in let x = 2 in x").unwrap(),
            Value::Integer(2)
        );
        // The let binding does not leak.
        assert_eq!(
            eval("(let x = 1 in x) + (let x = 2 in x)").unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn undefined_name_is_an_error() {
        assert_eq!(
            eval("missing"),
            Err(EvalError::UndefinedName("missing".to_string()))
        );
    }

    #[test]
    fn environment_names_resolve() {
        let mut env = Environment::new();
        env.define("target", Value::String("alice".to_string()));
        assert_eq!(
            eval_in("target == \"alice\"", &env).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn capability_call_is_an_internal_error() {
        let expr = parse_expression("do \"cap.echo\" {}").expect("should parse");
        let result = Evaluator::new().eval_expr(&expr, &Environment::new());
        assert!(matches!(result, Err(EvalError::Internal(_))));
    }

    #[test]
    fn conditionals_use_truthiness() {
        assert_eq!(eval("if null then 1 else 2").unwrap(), Value::Integer(2));
        assert_eq!(eval("if 0 then 1 else 2").unwrap(), Value::Integer(1));
    }
}
