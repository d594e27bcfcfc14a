use super::errors::{invalid_input, invalid_literal};
use super::Rule;
use crate::ast::{
    BinaryExpr, BinaryOp, BindingAst, CallExpr, Expression, FieldExpr, IfExpr, IndexExpr, LetExpr,
    Literal, ProgramAst, RoundAst, UnaryExpr, UnaryOp,
};
use crate::error::ParseError;
use pest::iterators::Pair;

pub(super) fn build_program(pair: Pair<Rule>) -> Result<ProgramAst, ParseError> {
    let program_span = pair.clone();
    let mut rounds = Vec::new();
    let mut score = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::plan_section => rounds = build_plan_section(inner)?,
            Rule::expression => score = Some(build_expression(inner)?),
            Rule::EOI => {}
            other => {
                return Err(invalid_input(
                    &format!("unexpected {:?} at program level", other),
                    &program_span,
                ))
            }
        }
    }
    let score = score.ok_or_else(|| invalid_input("program has no score expression", &program_span))?;
    Ok(ProgramAst { rounds, score })
}

fn build_plan_section(pair: Pair<Rule>) -> Result<Vec<RoundAst>, ParseError> {
    // The bindings directly after `plan` form round 0; every `then` block
    // opens a later round.
    let mut rounds = Vec::new();
    let mut first = RoundAst { bindings: Vec::new() };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::kw_plan => {}
            Rule::binding => first.bindings.push(build_binding(inner)?),
            Rule::round => rounds.push(build_round(inner)?),
            _ => {}
        }
    }
    rounds.insert(0, first);
    Ok(rounds)
}

fn build_round(pair: Pair<Rule>) -> Result<RoundAst, ParseError> {
    let mut bindings = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::binding {
            bindings.push(build_binding(inner)?);
        }
    }
    Ok(RoundAst { bindings })
}

fn build_binding(pair: Pair<Rule>) -> Result<BindingAst, ParseError> {
    let span = pair.clone();
    let mut inner = pair.into_inner();
    let name_pair = inner
        .next()
        .ok_or_else(|| invalid_input("binding missing name", &span))?;
    let value_pair = inner
        .next()
        .ok_or_else(|| invalid_input("binding missing value", &span))?;
    Ok(BindingAst {
        name: name_pair.as_str().to_string(),
        value: build_expression(value_pair)?,
    })
}

pub(super) fn build_expression(mut pair: Pair<Rule>) -> Result<Expression, ParseError> {
    // Drill through wrapper rules that carry a single interesting child.
    loop {
        match pair.as_rule() {
            Rule::expression | Rule::primary | Rule::accessor => {
                let span = pair.clone();
                let mut inner = pair.into_inner();
                pair = inner
                    .next()
                    .ok_or_else(|| invalid_input("empty expression", &span))?;
            }
            _ => break,
        }
    }
    match pair.as_rule() {
        Rule::if_expr => build_if_expr(pair),
        Rule::or_expr
        | Rule::and_expr
        | Rule::equality
        | Rule::comparison
        | Rule::additive
        | Rule::multiplicative => build_binary_chain(pair),
        Rule::unary => build_unary(pair),
        Rule::postfix => build_postfix(pair),
        Rule::call_expr => build_call_expr(pair),
        Rule::let_expr => build_let_expr(pair),
        Rule::literal => Ok(Expression::Literal(build_literal(pair)?)),
        Rule::object => build_object(pair),
        Rule::array => build_array(pair),
        Rule::identifier => Ok(Expression::Identifier(pair.as_str().to_string())),
        other => Err(invalid_input(
            &format!("unexpected rule {:?} in expression", other),
            &pair,
        )),
    }
}

fn build_if_expr(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let span = pair.clone();
    let mut exprs = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::expression)
        .map(build_expression)
        .collect::<Result<Vec<_>, _>>()?;
    if exprs.len() != 3 {
        return Err(invalid_input("if expression needs condition, then, else", &span));
    }
    let else_branch = exprs.pop().unwrap();
    let then_branch = exprs.pop().unwrap();
    let condition = exprs.pop().unwrap();
    Ok(Expression::If(IfExpr {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    }))
}

/// Fold a precedence-level pair (`operand (op operand)*`) into a
/// left-associative tree. A chain with no operator collapses to its single
/// operand.
fn build_binary_chain(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let span = pair.clone();
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| invalid_input("empty operator chain", &span))?;
    let mut expr = build_expression(first)?;
    while let Some(op_pair) = inner.next() {
        let rhs_pair = inner
            .next()
            .ok_or_else(|| invalid_input("operator missing right operand", &span))?;
        let op = build_binary_op(&op_pair)?;
        let rhs = build_expression(rhs_pair)?;
        expr = Expression::Binary(BinaryExpr {
            op,
            left: Box::new(expr),
            right: Box::new(rhs),
        });
    }
    Ok(expr)
}

fn build_binary_op(pair: &Pair<Rule>) -> Result<BinaryOp, ParseError> {
    let op = match (pair.as_rule(), pair.as_str()) {
        (Rule::or_op, _) => BinaryOp::Or,
        (Rule::and_op, _) => BinaryOp::And,
        (Rule::eq_op, "==") => BinaryOp::Eq,
        (Rule::eq_op, "!=") => BinaryOp::Ne,
        (Rule::cmp_op, "<") => BinaryOp::Lt,
        (Rule::cmp_op, "<=") => BinaryOp::Le,
        (Rule::cmp_op, ">") => BinaryOp::Gt,
        (Rule::cmp_op, ">=") => BinaryOp::Ge,
        (Rule::add_op, "+") => BinaryOp::Add,
        (Rule::add_op, "-") => BinaryOp::Sub,
        (Rule::mul_op, "*") => BinaryOp::Mul,
        (Rule::mul_op, "/") => BinaryOp::Div,
        (Rule::mul_op, "%") => BinaryOp::Rem,
        (rule, text) => {
            return Err(invalid_input(
                &format!("unknown operator {:?} `{}`", rule, text),
                pair,
            ))
        }
    };
    Ok(op)
}

fn build_unary(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let span = pair.clone();
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| invalid_input("empty unary expression", &span))?;
    match first.as_rule() {
        Rule::not_op | Rule::neg_op => {
            let op = if first.as_rule() == Rule::not_op {
                UnaryOp::Not
            } else {
                UnaryOp::Neg
            };
            let operand_pair = inner
                .next()
                .ok_or_else(|| invalid_input("unary operator missing operand", &span))?;
            Ok(Expression::Unary(UnaryExpr {
                op,
                operand: Box::new(build_expression(operand_pair)?),
            }))
        }
        _ => build_expression(first),
    }
}

fn build_postfix(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let span = pair.clone();
    let mut inner = pair.into_inner();
    let base = inner
        .next()
        .ok_or_else(|| invalid_input("empty postfix expression", &span))?;
    let mut expr = build_expression(base)?;
    for accessor in inner {
        let span = accessor.clone();
        let access = accessor
            .into_inner()
            .next()
            .ok_or_else(|| invalid_input("empty accessor", &span))?;
        match access.as_rule() {
            Rule::field_access => {
                let field = access
                    .into_inner()
                    .next()
                    .ok_or_else(|| invalid_input("field access missing name", &span))?;
                expr = Expression::Field(FieldExpr {
                    object: Box::new(expr),
                    field: field.as_str().to_string(),
                });
            }
            Rule::index_access => {
                let index = access
                    .into_inner()
                    .next()
                    .ok_or_else(|| invalid_input("index access missing index", &span))?;
                expr = Expression::Index(IndexExpr {
                    object: Box::new(expr),
                    index: Box::new(build_expression(index)?),
                });
            }
            other => {
                return Err(invalid_input(
                    &format!("unexpected accessor {:?}", other),
                    &span,
                ))
            }
        }
    }
    Ok(expr)
}

fn build_call_expr(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let span = pair.clone();
    let mut capability = None;
    let mut argument = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::kw_do => {}
            Rule::string => capability = Some(unquote(&inner)?),
            Rule::postfix => argument = Some(build_expression(inner)?),
            _ => {}
        }
    }
    let capability =
        capability.ok_or_else(|| invalid_input("capability call missing name", &span))?;
    let argument =
        argument.ok_or_else(|| invalid_input("capability call missing argument", &span))?;
    Ok(Expression::Call(CallExpr {
        capability,
        argument: Box::new(argument),
    }))
}

fn build_let_expr(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let span = pair.clone();
    let mut name = None;
    let mut exprs = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::identifier => name = Some(inner.as_str().to_string()),
            Rule::expression => exprs.push(build_expression(inner)?),
            _ => {}
        }
    }
    let name = name.ok_or_else(|| invalid_input("let missing name", &span))?;
    if exprs.len() != 2 {
        return Err(invalid_input("let needs a value and a body", &span));
    }
    let body = exprs.pop().unwrap();
    let value = exprs.pop().unwrap();
    Ok(Expression::Let(LetExpr {
        name,
        value: Box::new(value),
        body: Box::new(body),
    }))
}

fn build_object(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let mut entries = Vec::new();
    for entry in pair.into_inner() {
        let span = entry.clone();
        let mut inner = entry.into_inner();
        let key_pair = inner
            .next()
            .ok_or_else(|| invalid_input("object entry missing key", &span))?;
        let value_pair = inner
            .next()
            .ok_or_else(|| invalid_input("object entry missing value", &span))?;
        let key = build_object_key(key_pair)?;
        entries.push((key, build_expression(value_pair)?));
    }
    Ok(Expression::Object(entries))
}

fn build_object_key(pair: Pair<Rule>) -> Result<String, ParseError> {
    let span = pair.clone();
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| invalid_input("empty object key", &span))?;
    match inner.as_rule() {
        Rule::identifier => Ok(inner.as_str().to_string()),
        Rule::string => unquote(&inner),
        other => Err(invalid_input(
            &format!("unexpected object key {:?}", other),
            &span,
        )),
    }
}

fn build_array(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let elements = pair
        .into_inner()
        .map(build_expression)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expression::Array(elements))
}

pub(super) fn build_literal(pair: Pair<Rule>) -> Result<Literal, ParseError> {
    let span = pair.clone();
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| invalid_input("empty literal", &span))?;
    match inner.as_rule() {
        Rule::integer => inner
            .as_str()
            .parse::<i64>()
            .map(Literal::Integer)
            .map_err(|_| invalid_literal("integer literal out of range", &inner)),
        Rule::float => inner
            .as_str()
            .parse::<f64>()
            .map(Literal::Float)
            .map_err(|_| invalid_literal("malformed float literal", &inner)),
        Rule::string => Ok(Literal::String(unquote(&inner)?)),
        Rule::boolean => Ok(Literal::Boolean(inner.as_str() == "true")),
        Rule::null => Ok(Literal::Null),
        other => Err(invalid_literal(
            &format!("unexpected literal {:?}", other),
            &inner,
        )),
    }
}

/// Strip the surrounding quotes from a string token and resolve escapes.
fn unquote(pair: &Pair<Rule>) -> Result<String, ParseError> {
    let raw = pair.as_str();
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            other => {
                return Err(invalid_literal(
                    &format!("invalid escape sequence \\{}", other.unwrap_or(' ')),
                    pair,
                ))
            }
        }
    }
    Ok(out)
}
