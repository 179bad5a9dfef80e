//! Operators bound to a (type, kind, convention) key.
//!
//! Binding picks an invoker function for the convention once; invocation is
//! a single indirect call plus the panic guard. Every fault leaving an
//! invocation is wrapped as `Error::InternalOperatorFailure` with the key's
//! context and the offending arguments.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use typedval_core::convention::{
    ArgumentConvention, InvocationConvention, OperatorKind, ReturnConvention,
};
use typedval_core::hash::NULL_HASH_CODE;
use typedval_core::{Error, NativeValue, OperatorFault, Result, Type};

use crate::traits::{CompareOperator, EqualOperator, HashOperator, OperatorOutcome};

/// Identity of a bound operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorKey {
    pub ty: Type,
    pub kind: OperatorKind,
    pub convention: InvocationConvention,
}

impl OperatorKey {
    pub fn new(ty: Type, kind: OperatorKind, convention: InvocationConvention) -> Self {
        Self {
            ty,
            kind,
            convention,
        }
    }

    pub(crate) fn unsupported(&self, reason: impl Into<String>) -> Error {
        Error::UnsupportedOperator {
            type_signature: self.ty.signature().to_string(),
            kind: self.kind,
            convention: self.convention,
            reason: reason.into(),
        }
    }

    fn failure(&self, fault: OperatorFault, arguments: &[Option<&NativeValue>]) -> Error {
        let value = describe_arguments(arguments);
        #[cfg(feature = "tracing")]
        tracing::warn!(
            ty = %self.ty,
            kind = %self.kind,
            convention = %self.convention,
            %value,
            %fault,
            "operator invocation failed"
        );
        Error::InternalOperatorFailure {
            type_signature: self.ty.signature().to_string(),
            kind: self.kind,
            convention: self.convention,
            value,
            source: fault,
        }
    }
}

impl fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.ty, self.kind, self.convention)
    }
}

/// Run an operator call, turning a panic into `OperatorFault::Panic`.
fn guarded<T>(call: impl FnOnce() -> OperatorOutcome<T>) -> OperatorOutcome<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(outcome) => outcome,
        Err(payload) => Err(OperatorFault::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn describe_arguments(arguments: &[Option<&NativeValue>]) -> String {
    let shown: Vec<String> = arguments
        .iter()
        .map(|a| match a {
            Some(v) => format!("{v:?}"),
            None => "NULL".to_string(),
        })
        .collect();
    shown.join(", ")
}

fn present(value: Option<&NativeValue>) -> OperatorOutcome<&NativeValue> {
    value.ok_or(OperatorFault::NullArgument)
}

// ----- equal -----

type EqualInvoker =
    fn(&dyn EqualOperator, Option<&NativeValue>, Option<&NativeValue>) -> OperatorOutcome<bool>;

fn equal_never_null_fail(
    op: &dyn EqualOperator,
    l: Option<&NativeValue>,
    r: Option<&NativeValue>,
) -> OperatorOutcome<bool> {
    op.equal(present(l)?, present(r)?)?
        .ok_or(OperatorFault::IndeterminateResult)
}

/// Nested nulls match each other here, so equality stays reflexive and
/// agrees with the hash.
fn equal_never_null_default(
    op: &dyn EqualOperator,
    l: Option<&NativeValue>,
    r: Option<&NativeValue>,
) -> OperatorOutcome<bool> {
    op.not_distinct(present(l)?, present(r)?)
}

fn equal_nullable_fail(
    op: &dyn EqualOperator,
    l: Option<&NativeValue>,
    r: Option<&NativeValue>,
) -> OperatorOutcome<bool> {
    match (l, r) {
        (Some(l), Some(r)) => op.equal(l, r)?.ok_or(OperatorFault::IndeterminateResult),
        _ => Err(OperatorFault::IndeterminateResult),
    }
}

fn equal_nullable_default(
    op: &dyn EqualOperator,
    l: Option<&NativeValue>,
    r: Option<&NativeValue>,
) -> OperatorOutcome<bool> {
    match (l, r) {
        (Some(l), Some(r)) => op.not_distinct(l, r),
        _ => Ok(false),
    }
}

pub struct BoundEqualOperator {
    key: OperatorKey,
    implementation: Arc<dyn EqualOperator>,
    invoker: EqualInvoker,
}

impl BoundEqualOperator {
    pub(crate) fn bind(key: OperatorKey, implementation: Arc<dyn EqualOperator>) -> Self {
        use ArgumentConvention::*;
        use ReturnConvention::*;
        let c = key.convention;
        let invoker: EqualInvoker = match (c.argument, c.returns) {
            (NeverNull, FailOnNull) => equal_never_null_fail,
            (NeverNull, DefaultOnNull) => equal_never_null_default,
            (NullableBoxed, FailOnNull) => equal_nullable_fail,
            (NullableBoxed, DefaultOnNull) => equal_nullable_default,
        };
        Self {
            key,
            implementation,
            invoker,
        }
    }

    pub fn key(&self) -> &OperatorKey {
        &self.key
    }

    /// `None` stands for an explicit null argument.
    pub fn invoke(&self, left: Option<&NativeValue>, right: Option<&NativeValue>) -> Result<bool> {
        let op = self.implementation.as_ref();
        guarded(|| (self.invoker)(op, left, right))
            .map_err(|fault| self.key.failure(fault, &[left, right]))
    }
}

// ----- hash -----

type HashInvoker = fn(&dyn HashOperator, Option<&NativeValue>) -> OperatorOutcome<u64>;

fn hash_never_null(op: &dyn HashOperator, v: Option<&NativeValue>) -> OperatorOutcome<u64> {
    op.hash_code(present(v)?)
}

fn hash_nullable_fail(op: &dyn HashOperator, v: Option<&NativeValue>) -> OperatorOutcome<u64> {
    op.hash_code(v.ok_or(OperatorFault::IndeterminateResult)?)
}

fn hash_nullable_default(op: &dyn HashOperator, v: Option<&NativeValue>) -> OperatorOutcome<u64> {
    match v {
        Some(v) => op.hash_code(v),
        None => Ok(NULL_HASH_CODE),
    }
}

pub struct BoundHashOperator {
    key: OperatorKey,
    implementation: Arc<dyn HashOperator>,
    invoker: HashInvoker,
}

impl BoundHashOperator {
    pub(crate) fn bind(key: OperatorKey, implementation: Arc<dyn HashOperator>) -> Self {
        let c = key.convention;
        let invoker: HashInvoker = match (c.argument, c.returns) {
            (ArgumentConvention::NeverNull, _) => hash_never_null,
            (ArgumentConvention::NullableBoxed, ReturnConvention::FailOnNull) => hash_nullable_fail,
            (ArgumentConvention::NullableBoxed, ReturnConvention::DefaultOnNull) => {
                hash_nullable_default
            }
        };
        Self {
            key,
            implementation,
            invoker,
        }
    }

    pub fn key(&self) -> &OperatorKey {
        &self.key
    }

    pub fn invoke(&self, value: Option<&NativeValue>) -> Result<u64> {
        let op = self.implementation.as_ref();
        guarded(|| (self.invoker)(op, value)).map_err(|fault| self.key.failure(fault, &[value]))
    }
}

// ----- comparison -----

type CompareInvoker =
    fn(&dyn CompareOperator, Option<&NativeValue>, Option<&NativeValue>) -> OperatorOutcome<Ordering>;

fn compare_never_null(
    op: &dyn CompareOperator,
    l: Option<&NativeValue>,
    r: Option<&NativeValue>,
) -> OperatorOutcome<Ordering> {
    op.compare(present(l)?, present(r)?)
}

fn compare_nullable_fail(
    op: &dyn CompareOperator,
    l: Option<&NativeValue>,
    r: Option<&NativeValue>,
) -> OperatorOutcome<Ordering> {
    match (l, r) {
        (Some(l), Some(r)) => op.compare(l, r),
        _ => Err(OperatorFault::IndeterminateResult),
    }
}

pub struct BoundCompareOperator {
    key: OperatorKey,
    implementation: Arc<dyn CompareOperator>,
    invoker: CompareInvoker,
}

impl BoundCompareOperator {
    /// Ordering has no default answer for null input, so `DEFAULT_ON_NULL`
    /// cannot be bound.
    pub(crate) fn bind(key: OperatorKey, implementation: Arc<dyn CompareOperator>) -> Result<Self> {
        let c = key.convention;
        let invoker: CompareInvoker = match (c.argument, c.returns) {
            (_, ReturnConvention::DefaultOnNull) => {
                return Err(key.unsupported("comparison has no default result for null input"));
            }
            (ArgumentConvention::NeverNull, ReturnConvention::FailOnNull) => compare_never_null,
            (ArgumentConvention::NullableBoxed, ReturnConvention::FailOnNull) => {
                compare_nullable_fail
            }
        };
        Ok(Self {
            key,
            implementation,
            invoker,
        })
    }

    pub fn key(&self) -> &OperatorKey {
        &self.key
    }

    pub fn invoke(
        &self,
        left: Option<&NativeValue>,
        right: Option<&NativeValue>,
    ) -> Result<Ordering> {
        let op = self.implementation.as_ref();
        guarded(|| (self.invoker)(op, left, right))
            .map_err(|fault| self.key.failure(fault, &[left, right]))
    }
}

macro_rules! debug_by_key {
    ($($name:ident),*) => {$(
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.key).finish()
            }
        }
    )*};
}

debug_by_key!(BoundEqualOperator, BoundHashOperator, BoundCompareOperator);

/// A resolved operator of any kind, as held in the registry cache.
#[derive(Debug, Clone)]
pub enum BoundOperator {
    Equal(Arc<BoundEqualOperator>),
    HashCode(Arc<BoundHashOperator>),
    Comparison(Arc<BoundCompareOperator>),
}

impl BoundOperator {
    pub fn key(&self) -> &OperatorKey {
        match self {
            BoundOperator::Equal(op) => op.key(),
            BoundOperator::HashCode(op) => op.key(),
            BoundOperator::Comparison(op) => op.key(),
        }
    }

    pub fn kind(&self) -> OperatorKind {
        self.key().kind
    }

    pub fn as_equal(&self) -> Option<&Arc<BoundEqualOperator>> {
        match self {
            BoundOperator::Equal(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&Arc<BoundHashOperator>> {
        match self {
            BoundOperator::HashCode(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_comparison(&self) -> Option<&Arc<BoundCompareOperator>> {
        match self {
            BoundOperator::Comparison(op) => Some(op),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::IntegerOperators;
    use crate::structural::array_implementations;
    use crate::traits::Implementations;
    use typedval_core::TypeRegistry;

    fn key(sig: &str, kind: OperatorKind, convention: InvocationConvention) -> OperatorKey {
        let mut b = TypeRegistry::builder().with_builtins();
        let ty = b.register(sig).unwrap();
        OperatorKey::new(ty, kind, convention)
    }

    const NEVER_DEFAULT: InvocationConvention = InvocationConvention::simple(
        ReturnConvention::DefaultOnNull,
        ArgumentConvention::NeverNull,
    );
    const NEVER_FAIL: InvocationConvention = InvocationConvention::simple(
        ReturnConvention::FailOnNull,
        ArgumentConvention::NeverNull,
    );
    const BOXED_DEFAULT: InvocationConvention = InvocationConvention::simple(
        ReturnConvention::DefaultOnNull,
        ArgumentConvention::NullableBoxed,
    );
    const BOXED_FAIL: InvocationConvention = InvocationConvention::simple(
        ReturnConvention::FailOnNull,
        ArgumentConvention::NullableBoxed,
    );

    fn array_equal(convention: InvocationConvention) -> BoundEqualOperator {
        let element = Implementations::from_operators(IntegerOperators, true, true);
        let imps = array_implementations(&element);
        BoundEqualOperator::bind(
            key("array(bigint)", OperatorKind::Equal, convention),
            imps.equal.unwrap(),
        )
    }

    fn arr(values: &[Option<i64>]) -> NativeValue {
        NativeValue::Structural(values.iter().map(|v| v.map(NativeValue::Integer)).collect())
    }

    #[test]
    fn default_on_null_matches_nested_nulls() {
        let a = arr(&[Some(1), None]);
        let b = arr(&[Some(1), Some(2)]);
        for convention in [NEVER_DEFAULT, BOXED_DEFAULT] {
            let op = array_equal(convention);
            assert!(op.invoke(Some(&a), Some(&a)).unwrap(), "{convention}");
            assert!(op.invoke(Some(&a), Some(&a.clone())).unwrap(), "{convention}");
            assert!(!op.invoke(Some(&a), Some(&b)).unwrap(), "{convention}");
        }
        // A top-level null still gets the default answer.
        assert!(!array_equal(BOXED_DEFAULT).invoke(None, Some(&a)).unwrap());
    }

    #[test]
    fn fail_on_null_surfaces_indeterminate_as_internal_failure() {
        let a = arr(&[Some(1), None]);
        let err = array_equal(NEVER_FAIL).invoke(Some(&a), Some(&a)).unwrap_err();
        match err {
            Error::InternalOperatorFailure {
                kind,
                convention,
                value,
                source,
                ..
            } => {
                assert_eq!(kind, OperatorKind::Equal);
                assert_eq!(convention, NEVER_FAIL);
                assert_eq!(source, OperatorFault::IndeterminateResult);
                let shown = format!("{a:?}");
                assert_eq!(value, format!("{shown}, {shown}"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(array_equal(BOXED_FAIL).invoke(None, None).is_err());
    }

    #[test]
    fn never_null_rejects_explicit_null() {
        let a = arr(&[Some(1)]);
        let err = array_equal(NEVER_DEFAULT).invoke(None, Some(&a)).unwrap_err();
        assert!(matches!(
            err,
            Error::InternalOperatorFailure {
                source: OperatorFault::NullArgument,
                ..
            }
        ));
    }

    #[test]
    fn nullable_default_hash_of_null_is_null_hash_code() {
        let element = Implementations::from_operators(IntegerOperators, true, true);
        let op = BoundHashOperator::bind(
            key("bigint", OperatorKind::HashCode, BOXED_DEFAULT),
            element.hash.unwrap(),
        );
        assert_eq!(op.invoke(None).unwrap(), NULL_HASH_CODE);
    }

    #[test]
    fn comparison_cannot_bind_default_on_null() {
        let element = Implementations::from_operators(IntegerOperators, true, true);
        let err = BoundCompareOperator::bind(
            key("bigint", OperatorKind::Comparison, NEVER_DEFAULT),
            element.compare.unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator { .. }));
    }

    struct Exploding;

    impl EqualOperator for Exploding {
        fn equal(&self, _: &NativeValue, _: &NativeValue) -> OperatorOutcome<Option<bool>> {
            panic!("boom")
        }
    }

    #[test]
    fn panics_are_contained() {
        let op = BoundEqualOperator::bind(
            key("bigint", OperatorKind::Equal, NEVER_DEFAULT),
            Arc::new(Exploding),
        );
        let v = NativeValue::Integer(1);
        let err = op.invoke(Some(&v), Some(&NativeValue::Integer(2))).unwrap_err();
        assert!(matches!(
            err,
            Error::InternalOperatorFailure {
                source: OperatorFault::Panic(ref msg),
                ref value,
                ..
            } if msg == "boom" && value == "Integer(1), Integer(2)"
        ));
        assert!(err.to_string().contains("Integer(1), Integer(2)"));
    }

    #[test]
    fn null_argument_failure_names_the_null() {
        let element = Implementations::from_operators(IntegerOperators, true, true);
        let op = BoundHashOperator::bind(
            key("bigint", OperatorKind::HashCode, NEVER_FAIL),
            element.hash.unwrap(),
        );
        assert!(matches!(
            op.invoke(None).unwrap_err(),
            Error::InternalOperatorFailure {
                source: OperatorFault::NullArgument,
                ref value,
                ..
            } if value == "NULL"
        ));
    }
}
