use std::fmt;
use std::sync::Arc;

use typedval_core::hash::combine;
use typedval_core::prelude::{
    ArgumentConvention, Error, InvocationConvention, NativeValue, OperatorKind, Result,
    ReturnConvention, Type,
};
use typedval_operators::{BoundEqualOperator, BoundHashOperator, OperatorRegistry};

/// Equality is only invoked on two present values; nested nulls match each
/// other, consistent with the hash.
pub const EQUAL_CONVENTION: InvocationConvention =
    InvocationConvention::simple(ReturnConvention::DefaultOnNull, ArgumentConvention::NeverNull);

/// Hashing is only invoked on a present value; null hashing is defined here.
pub const HASH_CONVENTION: InvocationConvention =
    InvocationConvention::simple(ReturnConvention::FailOnNull, ArgumentConvention::NeverNull);

/// Immutable `(type, value-or-null)` pair.
///
/// For comparable types the equality and hash operators are resolved when the
/// value is constructed, so resolution failures surface there. Clones share
/// the type and the operators.
#[derive(Clone)]
pub struct TypedValue {
    ty: Type,
    value: Option<NativeValue>,
    equal_operator: Option<Arc<BoundEqualOperator>>,
    hash_operator: Option<Arc<BoundHashOperator>>,
    display_max_bytes: usize,
}

impl TypedValue {
    /// Fails with `TypeMismatch` if `value` is not `ty`'s representation, and
    /// with `UnknownType` if `ty` was not issued by `ops`' type registry.
    pub fn new(ops: &OperatorRegistry, ty: Type, value: Option<NativeValue>) -> Result<Self> {
        if !ops.types().contains(&ty) {
            return Err(Error::UnknownType(ty.signature().to_string()));
        }
        if let Some(v) = &value {
            ty.check_representation(v)?;
        }
        let (equal_operator, hash_operator) = if ty.is_comparable() {
            (
                Some(ops.equal_operator(&ty, EQUAL_CONVENTION)?),
                Some(ops.hash_operator(&ty, HASH_CONVENTION)?),
            )
        } else {
            (None, None)
        };
        Ok(Self {
            ty,
            value,
            equal_operator,
            hash_operator,
            display_max_bytes: ops.display_max_bytes(),
        })
    }

    pub fn of(ops: &OperatorRegistry, ty: Type, value: impl Into<NativeValue>) -> Result<Self> {
        Self::new(ops, ty, Some(value.into()))
    }

    pub fn as_null(ops: &OperatorRegistry, ty: Type) -> Result<Self> {
        Self::new(ops, ty, None)
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn native_value(&self) -> Option<&NativeValue> {
        self.value.as_ref()
    }

    pub(crate) fn display_max_bytes(&self) -> usize {
        self.display_max_bytes
    }

    /// `false` for different types; two nulls are equal, a null never equals
    /// a value. Fails with `UnsupportedOperator` when this value's type is not
    /// comparable, whatever `other` is.
    pub fn equals(&self, other: &TypedValue) -> Result<bool> {
        let op = self
            .equal_operator
            .as_ref()
            .ok_or_else(|| self.not_comparable(OperatorKind::Equal, EQUAL_CONVENTION))?;
        if self.ty != other.ty {
            return Ok(false);
        }
        match (&self.value, &other.value) {
            (None, None) => Ok(true),
            (Some(l), Some(r)) => op.invoke(Some(l), Some(r)),
            _ => Ok(false),
        }
    }

    /// Identity hash of the type, combined with the value hash when present.
    pub fn hash_code(&self) -> Result<u64> {
        let op = self
            .hash_operator
            .as_ref()
            .ok_or_else(|| self.not_comparable(OperatorKind::HashCode, HASH_CONVENTION))?;
        let identity = self.ty.identity_hash();
        match &self.value {
            None => Ok(identity),
            Some(v) => Ok(combine(identity, op.invoke(Some(v))?)),
        }
    }

    fn not_comparable(&self, kind: OperatorKind, convention: InvocationConvention) -> Error {
        Error::UnsupportedOperator {
            type_signature: self.ty.signature().to_string(),
            kind,
            convention,
            reason: "type is not comparable".into(),
        }
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedValue")
            .field("type", &self.ty)
            .field("value", &self.value)
            .finish()
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_display_string() {
            Ok(shown) => write!(f, "TypedValue{{type={}, value={shown}}}", self.ty),
            Err(_) => write!(f, "TypedValue{{type={}, value=<unprintable>}}", self.ty),
        }
    }
}
