//! Operators for arrays and rows, composed from their parameters' operators.
//!
//! Equality with nested nulls is three-valued: an unequal pair decides
//! `Some(false)` regardless of nulls elsewhere, otherwise any nested null
//! makes the result indeterminate (`None`). `not_distinct` instead matches
//! nested nulls with each other, in step with hashing, which treats a nested
//! null as `NULL_HASH_CODE`. Ordering cannot proceed through a nested null and
//! reports `IndeterminateResult`.

use std::cmp::Ordering;
use std::sync::Arc;

use typedval_core::hash::{combine, NULL_HASH_CODE};
use typedval_core::{NativeValue, OperatorFault, RepresentationKind};

use crate::scalar::{both, one};
use crate::traits::{
    CompareOperator, EqualOperator, HashOperator, Implementations, OperatorOutcome,
};

type Elements<'a> = &'a [Option<NativeValue>];

fn elements_of<'a>(
    left: &'a NativeValue,
    right: &'a NativeValue,
) -> OperatorOutcome<(Elements<'a>, Elements<'a>)> {
    both(left, right, RepresentationKind::Structural, NativeValue::as_elements)
}

/// Fold pairwise equality results with three-valued logic.
fn fold_equal<'a>(
    pairs: impl Iterator<Item = (&'a dyn EqualOperator, &'a Option<NativeValue>, &'a Option<NativeValue>)>,
) -> OperatorOutcome<Option<bool>> {
    let mut indeterminate = false;
    for (op, l, r) in pairs {
        match (l, r) {
            (Some(l), Some(r)) => match op.equal(l, r)? {
                Some(false) => return Ok(Some(false)),
                Some(true) => {}
                None => indeterminate = true,
            },
            _ => indeterminate = true,
        }
    }
    Ok(if indeterminate { None } else { Some(true) })
}

/// Pairwise `not_distinct`; the first distinct pair decides.
fn fold_not_distinct<'a>(
    pairs: impl Iterator<Item = (&'a dyn EqualOperator, &'a Option<NativeValue>, &'a Option<NativeValue>)>,
) -> OperatorOutcome<bool> {
    for (op, l, r) in pairs {
        let same = match (l, r) {
            (Some(l), Some(r)) => op.not_distinct(l, r)?,
            (None, None) => true,
            _ => false,
        };
        if !same {
            return Ok(false);
        }
    }
    Ok(true)
}

fn nested_hash(op: &dyn HashOperator, value: &Option<NativeValue>) -> OperatorOutcome<u64> {
    match value {
        Some(v) => op.hash_code(v),
        None => Ok(NULL_HASH_CODE),
    }
}

fn nested_compare(
    op: &dyn CompareOperator,
    left: &Option<NativeValue>,
    right: &Option<NativeValue>,
) -> OperatorOutcome<Ordering> {
    match (left, right) {
        (Some(l), Some(r)) => op.compare(l, r),
        _ => Err(OperatorFault::IndeterminateResult),
    }
}

/// Array implementations exist exactly where the element type has them.
pub fn array_implementations(element: &Implementations) -> Implementations {
    Implementations {
        equal: element
            .equal
            .clone()
            .map(|e| Arc::new(ArrayEqual(e)) as Arc<dyn EqualOperator>),
        hash: element
            .hash
            .clone()
            .map(|h| Arc::new(ArrayHash(h)) as Arc<dyn HashOperator>),
        compare: element
            .compare
            .clone()
            .map(|c| Arc::new(ArrayCompare(c)) as Arc<dyn CompareOperator>),
    }
}

/// Row implementations exist only where every field type has them.
pub fn row_implementations<'a>(
    fields: impl IntoIterator<Item = &'a Implementations>,
) -> Implementations {
    let fields: Vec<&Implementations> = fields.into_iter().collect();
    let equal: Option<Vec<_>> = fields.iter().map(|f| f.equal.clone()).collect();
    let hash: Option<Vec<_>> = fields.iter().map(|f| f.hash.clone()).collect();
    let compare: Option<Vec<_>> = fields.iter().map(|f| f.compare.clone()).collect();
    Implementations {
        equal: equal.map(|ops| Arc::new(RowEqual(ops)) as Arc<dyn EqualOperator>),
        hash: hash.map(|ops| Arc::new(RowHash(ops)) as Arc<dyn HashOperator>),
        compare: compare.map(|ops| Arc::new(RowCompare(ops)) as Arc<dyn CompareOperator>),
    }
}

pub struct ArrayEqual(Arc<dyn EqualOperator>);

impl EqualOperator for ArrayEqual {
    fn equal(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Option<bool>> {
        let (l, r) = elements_of(left, right)?;
        if l.len() != r.len() {
            return Ok(Some(false));
        }
        let op = self.0.as_ref();
        fold_equal(l.iter().zip(r).map(|(a, b)| (op, a, b)))
    }

    fn not_distinct(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<bool> {
        let (l, r) = elements_of(left, right)?;
        if l.len() != r.len() {
            return Ok(false);
        }
        let op = self.0.as_ref();
        fold_not_distinct(l.iter().zip(r).map(|(a, b)| (op, a, b)))
    }
}

pub struct ArrayHash(Arc<dyn HashOperator>);

impl HashOperator for ArrayHash {
    fn hash_code(&self, value: &NativeValue) -> OperatorOutcome<u64> {
        let elements = one(value, RepresentationKind::Structural, NativeValue::as_elements)?;
        elements.iter().try_fold(0u64, |acc, e| {
            Ok(combine(acc, nested_hash(self.0.as_ref(), e)?))
        })
    }
}

/// Lexicographic over the common prefix, then shorter first.
pub struct ArrayCompare(Arc<dyn CompareOperator>);

impl CompareOperator for ArrayCompare {
    fn compare(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Ordering> {
        let (l, r) = elements_of(left, right)?;
        for (a, b) in l.iter().zip(r) {
            match nested_compare(self.0.as_ref(), a, b)? {
                Ordering::Equal => {}
                decided => return Ok(decided),
            }
        }
        Ok(l.len().cmp(&r.len()))
    }
}

fn check_arity(values: Elements<'_>, arity: usize, whole: &NativeValue) -> OperatorOutcome<()> {
    if values.len() == arity {
        Ok(())
    } else {
        Err(OperatorFault::mismatch(RepresentationKind::Structural, whole))
    }
}

pub struct RowEqual(Vec<Arc<dyn EqualOperator>>);

impl EqualOperator for RowEqual {
    fn equal(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Option<bool>> {
        let (l, r) = elements_of(left, right)?;
        check_arity(l, self.0.len(), left)?;
        check_arity(r, self.0.len(), right)?;
        fold_equal(
            self.0
                .iter()
                .zip(l.iter().zip(r))
                .map(|(op, (a, b))| (op.as_ref(), a, b)),
        )
    }

    fn not_distinct(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<bool> {
        let (l, r) = elements_of(left, right)?;
        check_arity(l, self.0.len(), left)?;
        check_arity(r, self.0.len(), right)?;
        fold_not_distinct(
            self.0
                .iter()
                .zip(l.iter().zip(r))
                .map(|(op, (a, b))| (op.as_ref(), a, b)),
        )
    }
}

pub struct RowHash(Vec<Arc<dyn HashOperator>>);

impl HashOperator for RowHash {
    fn hash_code(&self, value: &NativeValue) -> OperatorOutcome<u64> {
        let fields = one(value, RepresentationKind::Structural, NativeValue::as_elements)?;
        check_arity(fields, self.0.len(), value)?;
        self.0.iter().zip(fields).try_fold(1u64, |acc, (op, f)| {
            Ok(combine(acc, nested_hash(op.as_ref(), f)?))
        })
    }
}

/// Field by field, first difference decides.
pub struct RowCompare(Vec<Arc<dyn CompareOperator>>);

impl CompareOperator for RowCompare {
    fn compare(&self, left: &NativeValue, right: &NativeValue) -> OperatorOutcome<Ordering> {
        let (l, r) = elements_of(left, right)?;
        check_arity(l, self.0.len(), left)?;
        check_arity(r, self.0.len(), right)?;
        for (op, (a, b)) in self.0.iter().zip(l.iter().zip(r)) {
            match nested_compare(op.as_ref(), a, b)? {
                Ordering::Equal => {}
                decided => return Ok(decided),
            }
        }
        Ok(Ordering::Equal)
    }
}
