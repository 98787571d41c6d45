use thiserror::Error;

use super::{JumpMode, Operator};

/// An IR node could not be constructed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid swizzle '{0}'")]
    InvalidSwizzle(String),

    #[error("swizzle component '{component}' is out of range for {ty}")]
    SwizzleRange { component: char, ty: String },

    #[error("cannot swizzle a value of type {0}")]
    NotSwizzlable(String),

    #[error("cannot dereference a value of type {0}")]
    NotDereferenceable(String),

    #[error("cannot sample through a value of type {0}")]
    NotSampler(String),

    #[error("cannot index a value of type {0}")]
    NotIndexable(String),

    #[error("array index must be an integer scalar, found {0}")]
    BadIndex(String),

    #[error("type {ty} has no field named '{field}'")]
    NoSuchField { ty: String, field: String },

    #[error("operator '{op}' takes {expected} operand(s), found {found}")]
    OperandCount { op: Operator, expected: usize, found: usize },

    #[error("'{0}' is not a comparison operator")]
    NotComparison(Operator),

    #[error("invalid write mask '{0}'")]
    InvalidWriteMask(String),

    #[error("a constant of type {ty} cannot hold {found} value(s)")]
    ConstantShape { ty: String, found: usize },

    #[error("'{0}' used outside of a loop")]
    NoEnclosingLoop(JumpMode),
}
