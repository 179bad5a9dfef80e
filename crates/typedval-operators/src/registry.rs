//! Operator resolution with a lock-free, append-only cache.
//!
//! The registry owns a snapshot of the type registry. Each
//! (type, kind, convention) triple maps to one `OnceCell` slot, so a bound
//! operator is built at most once and every later lookup is a plain read.
//! Concurrent first requests may race to build; exactly one result is
//! published and all callers observe it.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use typedval_core::convention::{InvocationConvention, OperatorKind};
use typedval_core::{
    Error, RepresentationKind, Result, Structure, Type, TypeDescriptor, TypeRegistry,
};

use crate::bound::{
    BoundCompareOperator, BoundEqualOperator, BoundHashOperator, BoundOperator, OperatorKey,
};
use crate::scalar::{BooleanOperators, BytesOperators, FloatOperators, IntegerOperators};
use crate::structural::{array_implementations, row_implementations};
use crate::traits::Implementations;

const SLOTS_PER_TYPE: usize = OperatorKind::ALL.len() * InvocationConvention::COUNT;

pub struct OperatorRegistry {
    types: Arc<TypeRegistry>,
    implementations: Vec<Implementations>,
    cache: Vec<OnceCell<BoundOperator>>,
}

impl OperatorRegistry {
    /// Registry using the default implementation for every type.
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        OperatorRegistryBuilder::new(types).build()
    }

    pub fn builder(types: Arc<TypeRegistry>) -> OperatorRegistryBuilder {
        OperatorRegistryBuilder::new(types)
    }

    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    pub fn display_max_bytes(&self) -> usize {
        self.types.display_max_bytes()
    }

    /// Resolve the operator for `(ty, kind, convention)`, binding it on first
    /// use. Failed resolutions are not cached and fail the same way again.
    pub fn resolve(
        &self,
        ty: &Type,
        kind: OperatorKind,
        convention: InvocationConvention,
    ) -> Result<BoundOperator> {
        if !self.types.contains(ty) {
            return Err(Error::UnknownType(ty.signature().to_string()));
        }
        let slot = ty.id().index() * SLOTS_PER_TYPE
            + kind.index() * InvocationConvention::COUNT
            + convention.index();
        let cell = self
            .cache
            .get(slot)
            .ok_or_else(|| Error::UnknownType(ty.signature().to_string()))?;
        cell.get_or_try_init(|| self.bind(ty, kind, convention))
            .cloned()
    }

    pub fn equal_operator(
        &self,
        ty: &Type,
        convention: InvocationConvention,
    ) -> Result<Arc<BoundEqualOperator>> {
        match self.resolve(ty, OperatorKind::Equal, convention)? {
            BoundOperator::Equal(op) => Ok(op),
            other => Err(kind_confusion(other.key())),
        }
    }

    pub fn hash_operator(
        &self,
        ty: &Type,
        convention: InvocationConvention,
    ) -> Result<Arc<BoundHashOperator>> {
        match self.resolve(ty, OperatorKind::HashCode, convention)? {
            BoundOperator::HashCode(op) => Ok(op),
            other => Err(kind_confusion(other.key())),
        }
    }

    pub fn comparison_operator(
        &self,
        ty: &Type,
        convention: InvocationConvention,
    ) -> Result<Arc<BoundCompareOperator>> {
        match self.resolve(ty, OperatorKind::Comparison, convention)? {
            BoundOperator::Comparison(op) => Ok(op),
            other => Err(kind_confusion(other.key())),
        }
    }

    /// Number of operators bound so far.
    pub fn cached_operator_count(&self) -> usize {
        self.cache.iter().filter(|c| c.get().is_some()).count()
    }

    fn bind(
        &self,
        ty: &Type,
        kind: OperatorKind,
        convention: InvocationConvention,
    ) -> Result<BoundOperator> {
        let key = OperatorKey::new(ty.clone(), kind, convention);
        let imps = &self.implementations[ty.id().index()];
        let bound = match kind {
            OperatorKind::Equal | OperatorKind::HashCode if !ty.is_comparable() => {
                return Err(key.unsupported("type is not comparable"));
            }
            OperatorKind::Comparison if !ty.is_orderable() => {
                return Err(key.unsupported("type is not orderable"));
            }
            OperatorKind::Equal => {
                let op = imps
                    .equal
                    .clone()
                    .ok_or_else(|| key.unsupported("no equal implementation registered"))?;
                BoundOperator::Equal(Arc::new(BoundEqualOperator::bind(key, op)))
            }
            OperatorKind::HashCode => {
                let op = imps
                    .hash
                    .clone()
                    .ok_or_else(|| key.unsupported("no hash implementation registered"))?;
                BoundOperator::HashCode(Arc::new(BoundHashOperator::bind(key, op)))
            }
            OperatorKind::Comparison => {
                let op = imps
                    .compare
                    .clone()
                    .ok_or_else(|| key.unsupported("no comparison implementation registered"))?;
                BoundOperator::Comparison(Arc::new(BoundCompareOperator::bind(key, op)?))
            }
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(operator = %bound.key(), "bound operator");
        Ok(bound)
    }
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("types", &self.types.len())
            .field("cached", &self.cached_operator_count())
            .finish()
    }
}

fn kind_confusion(key: &OperatorKey) -> Error {
    key.unsupported("cached operator has a different kind")
}

/// Builds the implementation table. Custom implementations may be supplied
/// for any registered type; everything else gets the default for its
/// representation, with structural types composed from their parameters.
pub struct OperatorRegistryBuilder {
    types: Arc<TypeRegistry>,
    overrides: HashMap<usize, Implementations>,
}

impl OperatorRegistryBuilder {
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            types,
            overrides: HashMap::new(),
        }
    }

    /// Use `implementations` for `ty` instead of the default. Structural
    /// types registered after `ty` compose over the override.
    pub fn with_implementations(
        mut self,
        ty: &Type,
        implementations: Implementations,
    ) -> Result<Self> {
        if !self.types.contains(ty) {
            return Err(Error::UnknownType(ty.signature().to_string()));
        }
        self.overrides.insert(ty.id().index(), implementations);
        Ok(self)
    }

    pub fn build(mut self) -> OperatorRegistry {
        let mut table: Vec<Implementations> = Vec::with_capacity(self.types.len());
        for ty in self.types.types() {
            let imps = match self.overrides.remove(&ty.id().index()) {
                Some(custom) => custom,
                None => default_implementations(ty, &table),
            };
            table.push(imps);
        }
        let cache = (0..table.len() * SLOTS_PER_TYPE)
            .map(|_| OnceCell::new())
            .collect();
        OperatorRegistry {
            types: self.types,
            implementations: table,
            cache,
        }
    }
}

/// `built` holds every type registered before `ty`, which includes all of
/// its parameters.
fn default_implementations(ty: &TypeDescriptor, built: &[Implementations]) -> Implementations {
    let (comparable, orderable) = (ty.is_comparable(), ty.is_orderable());
    match ty.structure() {
        Some(Structure::Array(element)) => built
            .get(element.id().index())
            .map(array_implementations)
            .unwrap_or_default(),
        Some(Structure::Row(fields)) => {
            let field_imps: Option<Vec<&Implementations>> =
                fields.iter().map(|f| built.get(f.id().index())).collect();
            field_imps
                .map(|imps| row_implementations(imps))
                .unwrap_or_default()
        }
        None => match ty.kind() {
            RepresentationKind::Boolean => {
                Implementations::from_operators(BooleanOperators, comparable, orderable)
            }
            RepresentationKind::Integer => {
                Implementations::from_operators(IntegerOperators, comparable, orderable)
            }
            RepresentationKind::Float => {
                Implementations::from_operators(FloatOperators, comparable, orderable)
            }
            RepresentationKind::VarBytes => {
                Implementations::from_operators(BytesOperators, comparable, orderable)
            }
            RepresentationKind::Structural => Implementations::default(),
        },
    }
}
