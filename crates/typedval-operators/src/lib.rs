#![forbid(unsafe_code)]
//! typedval-operators: per-type equality, hash, and comparison.
//!
//! Design intent:
//! - One trait per operator kind (`traits`), implemented once per
//!   representation kind (`scalar`, `structural`).
//! - The `OperatorRegistry` builds a type -> implementation table once, when
//!   it is created, and memoizes bound operators per
//!   (type, kind, convention) in an append-only, lock-free cache.
//! - Calling conventions are turned into an invocation strategy when an
//!   operator is bound (`bound`); invocation never re-inspects them.

pub mod bound;
pub mod registry;
pub mod scalar;
pub mod structural;
pub mod traits;

pub use bound::{
    BoundCompareOperator, BoundEqualOperator, BoundHashOperator, BoundOperator, OperatorKey,
};
pub use registry::{OperatorRegistry, OperatorRegistryBuilder};
pub use traits::{CompareOperator, EqualOperator, HashOperator, Implementations, OperatorOutcome};
pub use typedval_core::convention::{
    ArgumentConvention, InvocationConvention, OperatorKind, ReturnConvention,
};
