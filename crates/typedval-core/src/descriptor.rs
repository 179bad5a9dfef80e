//! Type descriptors: the per-type metadata every other layer consults.
//!
//! A `TypeDescriptor` is created once, by the registry, and never changes. The
//! `Type` handle is a cheap shared reference to it; two handles are the same
//! type iff their signatures match.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::identity_hash;
use crate::id::TypeId;
use crate::types::{NativeValue, RepresentationKind};

/// Display formatter selected per type at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    Boolean,
    Decimal,
    /// Days since 1970-01-01 rendered as `YYYY-MM-DD`.
    Date,
    Float,
    Utf8,
    Hex,
    /// Values are not rendered; prints `<signature>`.
    Opaque,
    Array,
    Row,
}

impl Formatter {
    /// Whether this formatter can render values of `kind`.
    pub fn renders(self, kind: RepresentationKind) -> bool {
        use RepresentationKind as K;
        match self {
            Formatter::Opaque => true,
            Formatter::Boolean => kind == K::Boolean,
            Formatter::Decimal | Formatter::Date => kind == K::Integer,
            Formatter::Float => kind == K::Float,
            Formatter::Utf8 | Formatter::Hex => kind == K::VarBytes,
            Formatter::Array | Formatter::Row => kind == K::Structural,
        }
    }
}

/// Parameters of a structural type.
#[derive(Debug, Clone)]
pub enum Structure {
    Array(Type),
    Row(Vec<Type>),
}

#[derive(Debug)]
pub struct TypeDescriptor {
    id: TypeId,
    signature: String,
    kind: RepresentationKind,
    fixed_width: Option<usize>,
    comparable: bool,
    orderable: bool,
    formatter: Formatter,
    structure: Option<Structure>,
    identity_hash: u64,
}

impl TypeDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn scalar(
        id: TypeId,
        signature: impl Into<String>,
        kind: RepresentationKind,
        fixed_width: Option<usize>,
        comparable: bool,
        orderable: bool,
        formatter: Formatter,
    ) -> Self {
        let signature = signature.into();
        Self {
            id,
            identity_hash: identity_hash(&signature),
            signature,
            kind,
            fixed_width,
            comparable,
            orderable,
            formatter,
            structure: None,
        }
    }

    pub(crate) fn array(id: TypeId, signature: String, element: Type) -> Self {
        Self {
            id,
            identity_hash: identity_hash(&signature),
            signature,
            kind: RepresentationKind::Structural,
            fixed_width: None,
            comparable: element.comparable,
            orderable: element.orderable,
            formatter: Formatter::Array,
            structure: Some(Structure::Array(element)),
        }
    }

    pub(crate) fn row(id: TypeId, signature: String, fields: Vec<Type>) -> Self {
        Self {
            id,
            identity_hash: identity_hash(&signature),
            signature,
            kind: RepresentationKind::Structural,
            fixed_width: None,
            comparable: fields.iter().all(|f| f.comparable),
            orderable: fields.iter().all(|f| f.orderable),
            formatter: Formatter::Row,
            structure: Some(Structure::Row(fields)),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Canonical signature; this is the type's identity.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn kind(&self) -> RepresentationKind {
        self.kind
    }

    /// Byte width of one position in a fixed-width block, if any.
    pub fn fixed_width(&self) -> Option<usize> {
        self.fixed_width
    }

    pub fn is_comparable(&self) -> bool {
        self.comparable
    }

    pub fn is_orderable(&self) -> bool {
        self.orderable
    }

    pub fn formatter(&self) -> Formatter {
        self.formatter
    }

    pub fn structure(&self) -> Option<&Structure> {
        self.structure.as_ref()
    }

    pub fn parameters(&self) -> &[Type] {
        match &self.structure {
            None => &[],
            Some(Structure::Array(elem)) => std::slice::from_ref(elem),
            Some(Structure::Row(fields)) => fields,
        }
    }

    /// Stable hash of the signature, computed once at registration.
    pub fn identity_hash(&self) -> u64 {
        self.identity_hash
    }

    /// Check that `value`'s runtime representation is exactly this type's.
    pub fn check_representation(&self, value: &NativeValue) -> Result<()> {
        match self.mismatch_reason(value) {
            None => Ok(()),
            Some(reason) => Err(Error::TypeMismatch {
                type_signature: self.signature.clone(),
                value: format!("{value:?}"),
                reason,
            }),
        }
    }

    fn mismatch_reason(&self, value: &NativeValue) -> Option<String> {
        if value.kind() != self.kind {
            return Some(format!(
                "expected {} representation, found {}",
                self.kind,
                value.kind()
            ));
        }
        match (value, &self.structure) {
            (NativeValue::Integer(v), _) => {
                let fits = match self.fixed_width {
                    Some(1) => i8::try_from(*v).is_ok(),
                    Some(2) => i16::try_from(*v).is_ok(),
                    Some(4) => i32::try_from(*v).is_ok(),
                    _ => true,
                };
                (!fits).then(|| {
                    format!(
                        "{v} does not fit in {} bytes",
                        self.fixed_width.unwrap_or(8)
                    )
                })
            }
            (NativeValue::Float(v), _) if self.fixed_width == Some(4) => {
                let exact = v.is_nan() || (*v as f32) as f64 == *v;
                (!exact).then(|| format!("{v} is not exactly representable as a 32-bit float"))
            }
            (NativeValue::Structural(items), Some(Structure::Array(elem))) => {
                items.iter().enumerate().find_map(|(i, item)| {
                    let item = item.as_ref()?;
                    elem.mismatch_reason(item)
                        .map(|r| format!("element {i}: {r}"))
                })
            }
            (NativeValue::Structural(items), Some(Structure::Row(fields))) => {
                if items.len() != fields.len() {
                    return Some(format!(
                        "row has {} fields, value has {}",
                        fields.len(),
                        items.len()
                    ));
                }
                items
                    .iter()
                    .zip(fields)
                    .enumerate()
                    .find_map(|(i, (item, field))| {
                        let item = item.as_ref()?;
                        field
                            .mismatch_reason(item)
                            .map(|r| format!("field {i}: {r}"))
                    })
            }
            (NativeValue::Structural(_), None) => {
                Some("structural value for a type without parameters".into())
            }
            _ => None,
        }
    }

    /// Render a non-structural value with this type's formatter.
    ///
    /// Variable-width output is cut at `max_bytes` and suffixed with `…`.
    /// Structural values are rendered from their block by the value layer.
    pub fn format_scalar(&self, value: &NativeValue, max_bytes: usize, out: &mut String) -> Result<()> {
        use std::fmt::Write as _;

        let unexpected = || Error::TypeMismatch {
            type_signature: self.signature.clone(),
            value: format!("{value:?}"),
            reason: format!("{:?} formatter cannot render this value", self.formatter),
        };

        match (self.formatter, value) {
            (Formatter::Boolean, NativeValue::Boolean(b)) => {
                out.push_str(if *b { "true" } else { "false" })
            }
            (Formatter::Decimal, NativeValue::Integer(v)) => {
                let _ = write!(out, "{v}");
            }
            (Formatter::Date, NativeValue::Integer(days)) => {
                let (y, m, d) = civil_from_days(*days);
                let _ = write!(out, "{y:04}-{m:02}-{d:02}");
            }
            (Formatter::Float, NativeValue::Float(v)) => {
                if self.fixed_width == Some(4) {
                    let _ = write!(out, "{:?}", *v as f32);
                } else {
                    let _ = write!(out, "{v:?}");
                }
            }
            (Formatter::Utf8, NativeValue::Bytes(bytes)) => {
                let cut = bytes.len().min(max_bytes);
                let text = String::from_utf8_lossy(&bytes[..cut]);
                if cut < bytes.len() {
                    // A cut inside a multi-byte char shows up as a trailing U+FFFD.
                    out.push_str(text.trim_end_matches('\u{FFFD}'));
                    out.push('…');
                } else {
                    out.push_str(&text);
                }
            }
            (Formatter::Hex, NativeValue::Bytes(bytes)) => {
                let cut = bytes.len().min(max_bytes);
                for (i, b) in bytes[..cut].iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    let _ = write!(out, "{b:02x}");
                }
                if cut < bytes.len() {
                    out.push('…');
                }
            }
            (Formatter::Opaque, _) => {
                let _ = write!(out, "<{}>", self.signature);
            }
            _ => return Err(unexpected()),
        }
        Ok(())
    }
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}

/// Shared handle to a registered type.
#[derive(Clone)]
pub struct Type(Arc<TypeDescriptor>);

impl Type {
    pub(crate) fn new(descriptor: TypeDescriptor) -> Self {
        Self(Arc::new(descriptor))
    }
}

impl Deref for Type {
    type Target = TypeDescriptor;

    fn deref(&self) -> &TypeDescriptor {
        &self.0
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.signature == other.0.signature
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.signature.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.0.signature)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.signature)
    }
}
