use crate::ast::{Expression, ProgramAst};
use crate::error::ParseError;
use pest::Parser;

// Declare submodules
pub mod errors;
pub mod expressions;

use errors::from_pest_error;
use expressions::{build_expression, build_program};

// Define the parser struct using the grammar file
#[derive(pest_derive::Parser)]
#[grammar = "parser/tsl.pest"] // Path relative to src/
pub struct TslParser;

/// Parse a full plugin (plan section plus score expression).
pub fn parse_program(input: &str) -> Result<ProgramAst, ParseError> {
    let mut pairs = TslParser::parse(Rule::program, input).map_err(from_pest_error)?;
    let program_pair = pairs
        .next()
        .ok_or_else(|| ParseError::new("empty input", 1, 1))?;
    build_program(program_pair)
}

/// Parse a single expression; the whole input must be consumed.
pub fn parse_expression(input: &str) -> Result<Expression, ParseError> {
    let mut pairs = TslParser::parse(Rule::expr_input, input).map_err(from_pest_error)?;
    let input_pair = pairs
        .next()
        .ok_or_else(|| ParseError::new("empty input", 1, 1))?;
    let expr_pair = input_pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expression)
        .ok_or_else(|| ParseError::new("no expression found", 1, 1))?;
    build_expression(expr_pair)
}
