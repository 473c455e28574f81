//! Error types for filter construction and reference resolution.

use thiserror::Error;

/// Result type alias using [`FilterError`].
pub type Result<T> = std::result::Result<T, FilterError>;

/// Domain errors raised while building or resolving filter trees.
///
/// None of these are recoverable inside the operator algebra; they carry the
/// offending value or name back to whoever is building the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A value specification holds something other than a supported scalar.
    #[error("Malformed value: {reason}: {value}")]
    MalformedValue { reason: &'static str, value: String },

    /// An operator was given an unusable operand list.
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    /// A constant was built from a non-boolean.
    #[error("Invalid constant: a constant must be a bool, got {0}")]
    InvalidConstant(String),

    /// A reference name does not start with `#`.
    #[error("Syntax error: invalid reference name, a reference name must start with '#': {0}")]
    SyntaxError(String),

    /// A well-formed reference name has no binding.
    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    /// A node from one namespace was used where the other is expected.
    #[error("Namespace mismatch for {name}: {reason}")]
    NamespaceMismatch { name: String, reason: &'static str },
}

impl FilterError {
    pub fn malformed_value(reason: &'static str, value: impl ToString) -> Self {
        FilterError::MalformedValue {
            reason,
            value: value.to_string(),
        }
    }

    pub fn malformed_expression(msg: impl Into<String>) -> Self {
        FilterError::MalformedExpression(msg.into())
    }
}
