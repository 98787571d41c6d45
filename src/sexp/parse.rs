use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

use super::Node;

/// The grammar for S-expressions.
#[derive(Parser)]
#[grammar = "sexp/sexp.pest"]
struct Grammar;

/// Read a single S-expression.
///
/// The text must hold exactly one expression, optionally surrounded by
/// whitespace and comments.
pub fn read_expression(text: &str) -> Result<Node> {
    let mut pairs = Grammar::parse(Rule::single, text)?;
    let single = pairs.next().ok_or(Error::Empty)?;
    let expr = single.into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
        .ok_or(Error::Empty)?;
    parse_expr(expr)
}

/// Read every S-expression in a document.
pub fn read_expressions(text: &str) -> Result<Vec<Node>> {
    let mut pairs = Grammar::parse(Rule::document, text)?;
    let document = pairs.next().ok_or(Error::Empty)?;
    document.into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(parse_expr)
        .collect()
}

/// Parse an expression.
fn parse_expr(input: Pair<'_, Rule>) -> Result<Node> {
    match input.as_rule() {
        Rule::list => input.into_inner()
            .map(parse_expr)
            .collect::<Result<Vec<_>>>()
            .map(Node::List),
        Rule::int => input.as_str().parse::<i64>()
            .map(Node::Int)
            .map_err(|_| Error::Literal(input.as_str().to_owned())),
        Rule::float => input.as_str().parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Node::Float)
            .ok_or_else(|| Error::Literal(input.as_str().to_owned())),
        Rule::symbol => Ok(Node::Symbol(input.as_str().to_owned())),
        _ => unreachable!(),
    }
}

/// An S-expression could not be read.
#[derive(Debug, Error)]
pub enum Error {
    #[error("There was a grammatical error in the S-expression: {0}")]
    Grammar(#[from] Box<pest::error::Error<Rule>>),

    #[error("The numeric literal '{0}' is out of range")]
    Literal(String),

    #[error("No S-expression was found")]
    Empty,
}

impl From<pest::error::Error<Rule>> for Error {
    fn from(value: pest::error::Error<Rule>) -> Self {
        Self::Grammar(Box::new(value))
    }
}

/// A reading result.
pub type Result<T> = std::result::Result<T, Error>;
