//! The error taxonomy for the runtime core.
//!
//! Errors never unwind: every fallible internal call returns
//! `Result<Value, Error>`, and the outer evaluation entry points fold that
//! result into a `Value::Error` at the boundary described in spec §7.

use std::fmt;

/// A structured runtime failure.
///
/// Each variant corresponds to one bullet in the error taxonomy: type
/// mismatch, unknown overload, missing attribute/key/field, arithmetic and
/// domain errors, context (cancellation/deadline) errors, and invalid
/// identifiers.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An operand's type is incompatible with the requested operation.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// No implementation is bound to the given overload id.
    #[error("no such overload: {0}")]
    NoSuchOverload(String),

    /// An attribute's name could not be resolved in any candidate namespace.
    #[error("no such attribute: {0}")]
    NoSuchAttribute(String),

    /// A map qualification missed.
    #[error("no such key: {0}")]
    NoSuchKey(String),

    /// A proto-like field selection missed.
    #[error("no such field: {0}")]
    NoSuchField(String),

    /// An identifier could not be re-qualified into any known name.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// An index was out of the bounds of a list/string/bytes value.
    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange { index: i64, len: usize },

    /// A negative index was used against a type that does not define one.
    #[error("negative index not supported: {0}")]
    NegativeIndex(i64),

    /// Division or modulo by zero.
    #[error("divide by zero")]
    DivideByZero,

    /// An arithmetic operation overflowed its representable range.
    #[error("arithmetic overflow")]
    Overflow,

    /// A regular expression failed to compile or a base conversion failed.
    #[error("domain error: {0}")]
    Domain(String),

    /// The registry failed to construct an object from a field map.
    #[error("failed to construct {type_name}: {message}")]
    ConstructionFailed { type_name: String, message: String },

    /// An iterable was required but the operand does not support iteration.
    #[error("not iterable: {0}")]
    NotIterable(String),

    /// The evaluation context signalled cancellation.
    #[error("evaluation cancelled")]
    Cancelled,

    /// The evaluation context's deadline was exceeded.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Attribute or comprehension recursion exceeded the configured limit.
    #[error("computation depth exceeded")]
    ComputationDepthExceeded,

    /// An invariant the planner or resolver assumed was violated.
    ///
    /// Reaching this indicates a bug in the core, not a user-facing failure;
    /// kept distinct from the other variants so callers can distinguish
    /// "your expression is wrong" from "the interpreter is wrong".
    #[error("unreachable: {0}")]
    Unreachable(&'static str),
}

impl Error {
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Rendered message used by `Value::Error`'s payload.
///
/// Kept as a thin wrapper rather than storing `Error` directly inside
/// `Value` so that `Value` does not need to depend on the full error enum
/// for `Clone`/`PartialEq`/`Hash` — only its textual message, matching
/// spec §3's "Error carrying a message".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorValue {
    pub message: String,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<Error> for ErrorValue {
    fn from(e: Error) -> Self {
        ErrorValue::new(e.to_string())
    }
}
