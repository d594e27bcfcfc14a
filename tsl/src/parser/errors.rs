use super::Rule;
use crate::error::ParseError;
use pest::iterators::Pair;

/// Convert a pest error into a `ParseError`, keeping the start position.
pub fn from_pest_error(err: pest::error::Error<Rule>) -> ParseError {
    let (line, column) = match err.line_col {
        pest::error::LineColLocation::Pos((line, col)) => (line, col),
        pest::error::LineColLocation::Span((line, col), _) => (line, col),
    };
    ParseError::new(err.variant.message().to_string(), line, column)
}

/// Build a `ParseError` positioned at the start of `pair`.
pub fn invalid_input(message: &str, pair: &Pair<Rule>) -> ParseError {
    let (line, column) = pair.as_span().start_pos().line_col();
    ParseError::new(message, line, column)
}

/// Build a `ParseError` for a malformed literal at `pair`.
pub fn invalid_literal(message: &str, pair: &Pair<Rule>) -> ParseError {
    invalid_input(message, pair)
}
