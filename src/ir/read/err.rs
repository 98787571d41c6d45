use thiserror::Error;

/// The kind of a reading failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The text is not a well-formed S-expression.
    Syntax,

    /// A tagged list has the wrong number of elements for its tag.
    Arity,

    /// A list is tagged with a symbol that names nothing.
    UnknownTag,

    /// A type, variable, function or operator name has no binding.
    UnresolvedSymbol,

    /// A recognized construct that reading does not support.
    UnsupportedFeature,

    /// A well-tagged construct whose contents are invalid.
    Malformed,

    /// An IR node could not exist where it was written.
    InvariantViolation,
}

/// IR could not be read.
#[derive(Clone, Debug, Error)]
#[error("{}error: {message}{}", in_function(.function), in_context(.context))]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    /// The function being read when the error occurred.
    pub function: Option<String>,
    /// The S-expression at fault, as text.
    pub context: Option<String>,
}

impl Error {
    /// Construct an [`Error`] with no location.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), function: None, context: None }
    }
}

fn in_function(function: &Option<String>) -> String {
    function.as_ref()
        .map(|f| format!("In function {}:\n", f))
        .unwrap_or_default()
}

fn in_context(context: &Option<String>) -> String {
    context.as_ref()
        .map(|c| format!("\n...in this context:\n   {}", c))
        .unwrap_or_default()
}

/// A reading result.
pub type Result<T> = std::result::Result<T, Error>;
