//! Generic S-expressions.
//!
//! This layer knows nothing about the IR: it turns text into a tree of
//! symbols, numbers and lists, and back.  Meaning is assigned by
//! [`ir::read`](crate::ir::read).

mod fmt;
mod parse;

pub use parse::{read_expression, read_expressions, Error, Result, Rule};

/// An S-expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A bare identifier, such as `declare` or `+`.
    Symbol(String),

    /// An integer literal.
    Int(i64),

    /// A floating-point literal.
    Float(f64),

    /// A parenthesized sequence of expressions.
    List(Vec<Node>),
}

impl Node {
    /// The text of a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// The elements of a list.
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// The value of a number, integer or not.
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Self::Int(x) => Some(x as f64),
            Self::Float(x) => Some(x),
            _ => None,
        }
    }

    /// The value of an integer.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Self::Int(x) => Some(x),
            _ => None,
        }
    }

    /// The leading symbol of a list, if it has one.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_symbol()
    }

    /// Whether this is the empty list `()`.
    pub fn is_empty_list(&self) -> bool {
        matches!(self, Self::List(list) if list.is_empty())
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Symbol(value.to_owned())
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Self::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: Vec<Node>) -> Node {
        Node::List(items)
    }

    #[test]
    fn reads_atoms_and_lists() {
        let node = read_expression("(declare (uniform) float x)").unwrap();
        assert_eq!(node, list(vec![
            "declare".into(),
            list(vec!["uniform".into()]),
            "float".into(),
            "x".into(),
        ]));
        assert_eq!(node.head(), Some("declare"));
    }

    #[test]
    fn distinguishes_numbers() {
        let node = read_expression("(1 -2 3.5 -0.25 1e3 .5 -)").unwrap();
        assert_eq!(node, list(vec![
            1i64.into(),
            (-2i64).into(),
            3.5.into(),
            (-0.25).into(),
            1000.0.into(),
            0.5.into(),
            "-".into(),
        ]));
    }

    #[test]
    fn operator_symbols_are_symbols() {
        let node = read_expression("(+ <= && ^^ neg dFdx)").unwrap();
        let syms: Vec<_> = node.as_list().unwrap().iter()
            .map(|n| n.as_symbol().unwrap())
            .collect();
        assert_eq!(syms, ["+", "<=", "&&", "^^", "neg", "dFdx"]);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(read_expression("(a (b c)").is_err());
        assert!(read_expression("a)").is_err());
        assert!(read_expression("(1.5x)").is_err());
        assert!(read_expression("(12abc)").is_err());
        assert!(read_expression("").is_err());
        assert!(read_expression("a b").is_err());
        assert!(read_expression("99999999999999999999").is_err());
    }

    #[test]
    fn reads_documents() {
        let nodes = read_expressions("a ; comment\n(b) 3").unwrap();
        assert_eq!(nodes, vec!["a".into(), list(vec!["b".into()]), 3i64.into()]);
        assert!(read_expressions("  ").unwrap().is_empty());
    }

    #[test]
    fn printing_reads_back_identically() {
        let text = "((declare (in) vec4 pos) \
                    (assign () (xy) (var_ref v) (constant vec2 (1.0 -2.5e-3))) \
                    (expression int neg (constant int (-7))))";
        let node = read_expression(text).unwrap();
        let printed = node.to_string();
        assert_eq!(read_expression(&printed).unwrap(), node);
        assert_eq!(read_expression(&printed).unwrap().to_string(), printed);
    }
}
