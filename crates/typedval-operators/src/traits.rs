//! Operator traits + the per-type implementation set.
//!
//! Raw operators only ever see non-null values; null handling belongs to the
//! calling convention chosen when the operator is bound.
//!
//! Invariants:
//! - Implementations must be pure and deterministic.
//! - `equal(a, b) == Some(true)` and `not_distinct(a, b)` both imply
//!   `hash_code(a) == hash_code(b)`.
//! - `not_distinct` is reflexive, including for values with nested nulls.
//! - A value whose variant does not match the operator's representation is
//!   reported as `OperatorFault::RepresentationMismatch`, never coerced.

use std::cmp::Ordering;
use std::sync::Arc;

use typedval_core::{NativeValue, OperatorFault};

pub type OperatorOutcome<T> = std::result::Result<T, OperatorFault>;

pub trait EqualOperator: Send + Sync {
    /// `Ok(None)` means indeterminate: a nested null took part in the
    /// comparison and no element pair was already unequal.
    fn equal(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Option<bool>>;

    /// Definite equality: a nested null matches a nested null and never a
    /// value, the same way `hash_code` treats every nested null alike.
    /// Scalars have no nested nulls, so the default only collapses `None`.
    fn not_distinct(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<bool> {
        Ok(self.equal(left, right)?.unwrap_or(false))
    }
}

pub trait HashOperator: Send + Sync {
    fn hash_code(&self, value: &NativeValue) -> OperatorOutcome<u64>;
}

pub trait CompareOperator: Send + Sync {
    fn compare(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Ordering>;
}

/// Operators available for one type. A missing entry means the type lacks
/// the capability.
#[derive(Clone, Default)]
pub struct Implementations {
    pub equal: Option<Arc<dyn EqualOperator>>,
    pub hash: Option<Arc<dyn HashOperator>>,
    pub compare: Option<Arc<dyn CompareOperator>>,
}

impl Implementations {
    /// Share one value implementing all three kinds, gated by capability.
    pub fn from_operators<T>(operators: T, comparable: bool, orderable: bool) -> Self
    where
        T: EqualOperator + HashOperator + CompareOperator + 'static,
    {
        let operators = Arc::new(operators);
        Self {
            equal: comparable.then(|| operators.clone() as Arc<dyn EqualOperator>),
            hash: comparable.then(|| operators.clone() as Arc<dyn HashOperator>),
            compare: orderable.then(|| operators as Arc<dyn CompareOperator>),
        }
    }
}

impl std::fmt::Debug for Implementations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Implementations")
            .field("equal", &self.equal.is_some())
            .field("hash", &self.hash.is_some())
            .field("compare", &self.compare.is_some())
            .finish()
    }
}
