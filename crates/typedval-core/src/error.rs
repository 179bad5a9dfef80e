use thiserror::Error;

use crate::convention::{InvocationConvention, OperatorKind};
use crate::types::RepresentationKind;

/// Canonical result for every typedval crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error: the type was never registered at bootstrap.
    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("invalid type signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("value {value} does not match type {type_signature}: {reason}")]
    TypeMismatch {
        type_signature: String,
        value: String,
        reason: String,
    },

    #[error("type {type_signature} does not support {kind} with convention {convention}: {reason}")]
    UnsupportedOperator {
        type_signature: String,
        kind: OperatorKind,
        convention: InvocationConvention,
        reason: String,
    },

    #[error("{kind} operator for type {type_signature} failed on {value} (convention {convention})")]
    InternalOperatorFailure {
        type_signature: String,
        kind: OperatorKind,
        convention: InvocationConvention,
        /// Debug rendering of the invocation's arguments, `NULL` for a null.
        value: String,
        #[source]
        source: OperatorFault,
    },

    #[error("corrupt block: {0}")]
    CorruptBlock(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serde(e.to_string())
    }
}

/// Cause of a failed operator invocation. Always wrapped in
/// [`Error::InternalOperatorFailure`] before it leaves the operator boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorFault {
    #[error("null argument passed to a NEVER_NULL operator")]
    NullArgument,

    #[error("result is indeterminate for null-containing input under FAIL_ON_NULL")]
    IndeterminateResult,

    #[error("native value {value} is not a {expected} representation")]
    RepresentationMismatch {
        expected: RepresentationKind,
        value: String,
    },

    #[error("operator panicked: {0}")]
    Panic(String),
}

impl OperatorFault {
    pub fn mismatch(expected: RepresentationKind, value: &impl std::fmt::Debug) -> Self {
        OperatorFault::RepresentationMismatch {
            expected,
            value: format!("{value:?}"),
        }
    }
}
