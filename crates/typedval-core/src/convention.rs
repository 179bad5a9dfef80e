//! Operator kinds and calling conventions.
//!
//! A convention says how nulls cross an operator boundary: whether arguments
//! may carry an explicit null, and what the operator returns when it cannot
//! answer. Conventions are fixed when an operator is bound and never inspected
//! again on the invocation path.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Equal,
    HashCode,
    Comparison,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 3] = [
        OperatorKind::Equal,
        OperatorKind::HashCode,
        OperatorKind::Comparison,
    ];

    /// Dense index used by the operator cache.
    pub const fn index(self) -> usize {
        match self {
            OperatorKind::Equal => 0,
            OperatorKind::HashCode => 1,
            OperatorKind::Comparison => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OperatorKind::Equal => "equal",
            OperatorKind::HashCode => "hash_code",
            OperatorKind::Comparison => "comparison",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArgumentConvention {
    /// Caller guarantees a concrete, unwrapped value.
    NeverNull,
    /// Arguments may represent null explicitly.
    NullableBoxed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnConvention {
    /// The operator cannot answer for null-containing input.
    FailOnNull,
    /// Undefined input yields the type-appropriate default.
    DefaultOnNull,
}

/// Convention applied uniformly to every argument of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationConvention {
    pub argument: ArgumentConvention,
    pub returns: ReturnConvention,
}

impl InvocationConvention {
    /// Number of distinct conventions; sizes the per-kind cache stripe.
    pub const COUNT: usize = 4;

    pub const fn simple(returns: ReturnConvention, argument: ArgumentConvention) -> Self {
        Self { argument, returns }
    }

    pub const fn index(self) -> usize {
        let arg = match self.argument {
            ArgumentConvention::NeverNull => 0,
            ArgumentConvention::NullableBoxed => 1,
        };
        let ret = match self.returns {
            ReturnConvention::FailOnNull => 0,
            ReturnConvention::DefaultOnNull => 1,
        };
        arg * 2 + ret
    }
}

impl fmt::Display for ArgumentConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentConvention::NeverNull => f.write_str("NEVER_NULL"),
            ArgumentConvention::NullableBoxed => f.write_str("NULLABLE_BOXED"),
        }
    }
}

impl fmt::Display for ReturnConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnConvention::FailOnNull => f.write_str("FAIL_ON_NULL"),
            ReturnConvention::DefaultOnNull => f.write_str("DEFAULT_ON_NULL"),
        }
    }
}

impl fmt::Display for InvocationConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -> {}", self.argument, self.returns)
    }
}
