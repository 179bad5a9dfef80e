//! Type descriptor registry.
//!
//! Populated once through `TypeRegistryBuilder`, then frozen. The frozen
//! registry has no mutation API, so lookups need no locking and any number of
//! threads can share it behind an `Arc`.

use std::collections::HashMap;

use crate::config::TypeSystemConfig;
use crate::descriptor::{Formatter, Type, TypeDescriptor};
use crate::error::{Error, Result};
use crate::id::TypeId;
use crate::signature::TypeSignature;
use crate::types::RepresentationKind;

struct BuiltinType {
    name: &'static str,
    kind: RepresentationKind,
    width: Option<usize>,
    comparable: bool,
    orderable: bool,
    formatter: Formatter,
}

const fn builtin(
    name: &'static str,
    kind: RepresentationKind,
    width: Option<usize>,
    comparable: bool,
    formatter: Formatter,
) -> BuiltinType {
    BuiltinType {
        name,
        kind,
        width,
        comparable,
        orderable: comparable,
        formatter,
    }
}

const BUILTIN_TYPES: [BuiltinType; 11] = {
    use Formatter as F;
    use RepresentationKind as K;
    [
        builtin("boolean", K::Boolean, Some(1), true, F::Boolean),
        builtin("tinyint", K::Integer, Some(1), true, F::Decimal),
        builtin("smallint", K::Integer, Some(2), true, F::Decimal),
        builtin("integer", K::Integer, Some(4), true, F::Decimal),
        builtin("bigint", K::Integer, Some(8), true, F::Decimal),
        builtin("date", K::Integer, Some(4), true, F::Date),
        builtin("real", K::Float, Some(4), true, F::Float),
        builtin("double", K::Float, Some(8), true, F::Float),
        builtin("varchar", K::VarBytes, None, true, F::Utf8),
        builtin("varbinary", K::VarBytes, None, true, F::Hex),
        builtin("hyperloglog", K::VarBytes, None, false, F::Opaque),
    ]
};

#[derive(Debug)]
pub struct TypeRegistry {
    types: Vec<Type>,
    by_signature: HashMap<String, TypeId>,
    display_max_bytes: usize,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// Built-in types plus the config's extra parametric types.
    pub fn bootstrap(config: &TypeSystemConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = Self::builder()
            .with_builtins()
            .display_max_bytes(config.display_max_bytes);
        for signature in &config.extra_types {
            builder.register(signature)?;
        }
        Ok(builder.build())
    }

    /// Look a type up by signature. Any spelling that canonicalizes to a
    /// registered signature is accepted.
    pub fn describe(&self, signature: &str) -> Result<Type> {
        if let Some(id) = self.by_signature.get(signature) {
            return Ok(self.types[id.index()].clone());
        }
        let canonical = TypeSignature::parse(signature)?.canonical();
        self.by_signature
            .get(&canonical)
            .map(|id| self.types[id.index()].clone())
            .ok_or(Error::UnknownType(canonical))
    }

    pub fn get(&self, id: TypeId) -> Result<Type> {
        self.types
            .get(id.index())
            .cloned()
            .ok_or_else(|| Error::UnknownType(id.to_string()))
    }

    /// True if `ty` was issued by this registry.
    pub fn contains(&self, ty: &Type) -> bool {
        self.types
            .get(ty.id().index())
            .is_some_and(|own| own == ty)
    }

    /// Registered types in registration order; parameters precede the
    /// structural types that use them.
    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn display_max_bytes(&self) -> usize {
        self.display_max_bytes
    }
}

#[derive(Debug)]
pub struct TypeRegistryBuilder {
    types: Vec<Type>,
    by_signature: HashMap<String, TypeId>,
    display_max_bytes: usize,
}

impl Default for TypeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            by_signature: HashMap::new(),
            display_max_bytes: TypeSystemConfig::default().display_max_bytes,
        }
    }

    pub fn with_builtins(mut self) -> Self {
        for b in &BUILTIN_TYPES {
            if self.by_signature.contains_key(b.name) {
                continue;
            }
            self.push(|id| {
                TypeDescriptor::scalar(id, b.name, b.kind, b.width, b.comparable, b.orderable, b.formatter)
            });
        }
        self
    }

    pub fn display_max_bytes(mut self, max_bytes: usize) -> Self {
        self.display_max_bytes = max_bytes;
        self
    }

    /// Define a new non-structural base type.
    pub fn define(
        &mut self,
        name: &str,
        kind: RepresentationKind,
        fixed_width: Option<usize>,
        comparable: bool,
        orderable: bool,
        formatter: Formatter,
    ) -> Result<Type> {
        let name = match TypeSignature::parse(name)? {
            TypeSignature::Base(name) => name,
            other => {
                return Err(Error::Config(format!(
                    "custom type name must be a plain identifier, got {other}"
                )))
            }
        };
        if self.by_signature.contains_key(&name) {
            return Err(Error::Config(format!("type {name} is already registered")));
        }
        let width_ok = match kind {
            RepresentationKind::Boolean => fixed_width == Some(1),
            RepresentationKind::Integer => matches!(fixed_width, Some(1 | 2 | 4 | 8)),
            RepresentationKind::Float => matches!(fixed_width, Some(4 | 8)),
            RepresentationKind::VarBytes => fixed_width.is_none(),
            RepresentationKind::Structural => false,
        };
        if !width_ok {
            return Err(Error::Config(format!(
                "type {name}: {kind} representation cannot use fixed width {fixed_width:?}"
            )));
        }
        if !formatter.renders(kind) {
            return Err(Error::Config(format!(
                "type {name}: {formatter:?} formatter cannot render {kind} values"
            )));
        }
        if orderable && !comparable {
            return Err(Error::Config(format!(
                "type {name}: orderable types must also be comparable"
            )));
        }
        Ok(self.push(|id| {
            TypeDescriptor::scalar(id, name, kind, fixed_width, comparable, orderable, formatter)
        }))
    }

    /// Register a type by signature, registering its parameters first.
    /// Registering an already-known signature returns the existing type.
    pub fn register(&mut self, signature: &str) -> Result<Type> {
        let parsed = TypeSignature::parse(signature)?;
        self.register_signature(&parsed)
    }

    fn register_signature(&mut self, sig: &TypeSignature) -> Result<Type> {
        let canonical = sig.canonical();
        if let Some(id) = self.by_signature.get(&canonical) {
            return Ok(self.types[id.index()].clone());
        }
        match sig {
            TypeSignature::Base(name) => Err(Error::UnknownType(name.clone())),
            TypeSignature::Array(elem) => {
                let element = self.register_signature(elem)?;
                Ok(self.push(|id| TypeDescriptor::array(id, canonical, element)))
            }
            TypeSignature::Row(fields) => {
                let fields = fields
                    .iter()
                    .map(|f| self.register_signature(f))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.push(|id| TypeDescriptor::row(id, canonical, fields)))
            }
        }
    }

    fn push(&mut self, make: impl FnOnce(TypeId) -> TypeDescriptor) -> Type {
        let id = TypeId::new(self.types.len() as u32);
        let ty = Type::new(make(id));
        self.by_signature.insert(ty.signature().to_string(), id);
        self.types.push(ty.clone());
        ty
    }

    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            types: self.types,
            by_signature: self.by_signature,
            display_max_bytes: self.display_max_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::bootstrap(&TypeSystemConfig {
            extra_types: vec!["row(bigint, array(varchar))".into()],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn builtins_are_described() {
        let reg = registry();
        let bigint = reg.describe("bigint").unwrap();
        assert_eq!(bigint.kind(), RepresentationKind::Integer);
        assert_eq!(bigint.fixed_width(), Some(8));
        assert!(bigint.is_comparable() && bigint.is_orderable());

        let hll = reg.describe("hyperloglog").unwrap();
        assert!(!hll.is_comparable());
        assert!(!hll.is_orderable());
    }

    #[test]
    fn unknown_type_is_a_configuration_error() {
        let reg = registry();
        assert!(matches!(reg.describe("uuid"), Err(Error::UnknownType(_))));
        assert!(matches!(reg.describe("array(double)"), Err(Error::UnknownType(_))));
    }

    #[test]
    fn parametric_types_register_their_parameters_first() {
        let reg = registry();
        let row = reg.describe("ROW(bigint,array(VARCHAR))").unwrap();
        assert_eq!(row.signature(), "row(bigint, array(varchar))");
        let array = reg.describe("array(varchar)").unwrap();
        assert!(array.id() < row.id());
        assert_eq!(row.parameters()[1], array);
        assert!(row.is_comparable());
    }

    #[test]
    fn structural_flags_follow_parameters() {
        let mut builder = TypeRegistry::builder().with_builtins();
        let arr = builder.register("array(hyperloglog)").unwrap();
        assert!(!arr.is_comparable());
        assert!(!arr.is_orderable());
    }

    #[test]
    fn registering_twice_returns_the_same_type() {
        let mut builder = TypeRegistry::builder().with_builtins();
        let a = builder.register("array(bigint)").unwrap();
        let b = builder.register("array( BIGINT )").unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(builder.build().len(), BUILTIN_TYPES.len() + 1);
    }

    #[test]
    fn custom_types_are_validated() {
        let mut builder = TypeRegistry::builder().with_builtins();
        let ipaddr = builder
            .define("ipaddress", RepresentationKind::VarBytes, None, true, true, Formatter::Hex)
            .unwrap();
        assert_eq!(ipaddr.signature(), "ipaddress");

        let dup = builder.define("bigint", RepresentationKind::Integer, Some(8), true, true, Formatter::Decimal);
        assert!(matches!(dup, Err(Error::Config(_))));

        let bad_width = builder.define("wide", RepresentationKind::Integer, Some(3), true, true, Formatter::Decimal);
        assert!(matches!(bad_width, Err(Error::Config(_))));

        let reg = builder.build();
        assert!(reg.contains(&reg.describe("ipaddress").unwrap()));
    }

    #[test]
    fn custom_formatter_must_fit_the_representation() {
        let mut builder = TypeRegistry::builder().with_builtins();
        let cases = [
            (RepresentationKind::VarBytes, None, Formatter::Date),
            (RepresentationKind::Integer, Some(8), Formatter::Array),
            (RepresentationKind::Boolean, Some(1), Formatter::Row),
            (RepresentationKind::Float, Some(8), Formatter::Decimal),
            (RepresentationKind::Integer, Some(4), Formatter::Utf8),
        ];
        for (i, (kind, width, formatter)) in cases.into_iter().enumerate() {
            let result = builder.define(&format!("odd{i}"), kind, width, true, false, formatter);
            assert!(matches!(result, Err(Error::Config(_))), "{kind} with {formatter:?}");
        }
        let opaque = builder.define("blob", RepresentationKind::VarBytes, None, false, false, Formatter::Opaque);
        assert!(opaque.is_ok());
        let day = builder.define("epoch_day", RepresentationKind::Integer, Some(8), true, true, Formatter::Date);
        assert!(day.is_ok());
    }

    #[test]
    fn lookup_by_id_matches_lookup_by_signature() {
        let reg = registry();
        for ty in reg.types() {
            let by_id = reg.get(ty.id()).unwrap();
            assert_eq!(&by_id, ty);
            assert_eq!(reg.describe(ty.signature()).unwrap(), by_id);
        }
        let past_end = TypeId::new(reg.len() as u32);
        assert!(matches!(reg.get(past_end), Err(Error::UnknownType(_))));
    }

    #[test]
    fn overly_nested_lookup_is_an_invalid_signature() {
        let reg = registry();
        let deep = format!("{}bigint{}", "array(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(reg.describe(&deep), Err(Error::InvalidSignature { .. })));
    }
}
