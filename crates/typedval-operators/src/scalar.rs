//! Operators for scalar representations.
//!
//! Integers of every width share one implementation: the native value is
//! always an `i64`, and narrower types are range-checked on construction.
//! Floats use IEEE equality except that NaN equals NaN; `-0.0 == 0.0`.
//! Ordering of floats is total with NaN sorting last.

use std::cmp::Ordering;

use typedval_core::hash::{hash_bool, hash_bytes, hash_f64, hash_i64};
use typedval_core::{NativeValue, OperatorFault, RepresentationKind};

use crate::traits::{CompareOperator, EqualOperator, HashOperator, OperatorOutcome};

/// Extract both arguments as the same representation, or report whichever
/// one does not match.
pub(crate) fn both<'a, T>(
    left: &'a NativeValue,
    right: &'a NativeValue,
    expected: RepresentationKind,
    extract: impl Fn(&'a NativeValue) -> Option<T>,
) -> OperatorOutcome<(T, T)> {
    let l = extract(left).ok_or_else(|| OperatorFault::mismatch(expected, left))?;
    let r = extract(right).ok_or_else(|| OperatorFault::mismatch(expected, right))?;
    Ok((l, r))
}

pub(crate) fn one<'a, T>(
    value: &'a NativeValue,
    expected: RepresentationKind,
    extract: impl Fn(&'a NativeValue) -> Option<T>,
) -> OperatorOutcome<T> {
    extract(value).ok_or_else(|| OperatorFault::mismatch(expected, value))
}

/// Total order over f64: NaN is greater than everything and equal to itself.
pub fn float_order(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BooleanOperators;

impl EqualOperator for BooleanOperators {
    fn equal(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Option<bool>> {
        let (l, r) = both(left, right, RepresentationKind::Boolean, NativeValue::as_bool)?;
        Ok(Some(l == r))
    }
}

impl HashOperator for BooleanOperators {
    fn hash_code(&self, value: &NativeValue) -> OperatorOutcome<u64> {
        one(value, RepresentationKind::Boolean, NativeValue::as_bool).map(hash_bool)
    }
}

impl CompareOperator for BooleanOperators {
    fn compare(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Ordering> {
        let (l, r) = both(left, right, RepresentationKind::Boolean, NativeValue::as_bool)?;
        Ok(l.cmp(&r))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IntegerOperators;

impl EqualOperator for IntegerOperators {
    fn equal(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Option<bool>> {
        let (l, r) = both(left, right, RepresentationKind::Integer, NativeValue::as_i64)?;
        Ok(Some(l == r))
    }
}

impl HashOperator for IntegerOperators {
    fn hash_code(&self, value: &NativeValue) -> OperatorOutcome<u64> {
        one(value, RepresentationKind::Integer, NativeValue::as_i64).map(hash_i64)
    }
}

impl CompareOperator for IntegerOperators {
    fn compare(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Ordering> {
        let (l, r) = both(left, right, RepresentationKind::Integer, NativeValue::as_i64)?;
        Ok(l.cmp(&r))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FloatOperators;

impl EqualOperator for FloatOperators {
    fn equal(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Option<bool>> {
        let (l, r) = both(left, right, RepresentationKind::Float, NativeValue::as_f64)?;
        Ok(Some(l == r || (l.is_nan() && r.is_nan())))
    }
}

impl HashOperator for FloatOperators {
    fn hash_code(&self, value: &NativeValue) -> OperatorOutcome<u64> {
        one(value, RepresentationKind::Float, NativeValue::as_f64).map(hash_f64)
    }
}

impl CompareOperator for FloatOperators {
    fn compare(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Ordering> {
        let (l, r) = both(left, right, RepresentationKind::Float, NativeValue::as_f64)?;
        Ok(float_order(l, r))
    }
}

/// Byte strings: equality on content, lexicographic order by unsigned byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesOperators;

impl EqualOperator for BytesOperators {
    fn equal(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Option<bool>> {
        let (l, r) = both(left, right, RepresentationKind::VarBytes, NativeValue::as_bytes)?;
        Ok(Some(l == r))
    }
}

impl HashOperator for BytesOperators {
    fn hash_code(&self, value: &NativeValue) -> OperatorOutcome<u64> {
        one(value, RepresentationKind::VarBytes, NativeValue::as_bytes).map(hash_bytes)
    }
}

impl CompareOperator for BytesOperators {
    fn compare(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Ordering> {
        let (l, r) = both(left, right, RepresentationKind::VarBytes, NativeValue::as_bytes)?;
        Ok(l.cmp(r))
    }
}
