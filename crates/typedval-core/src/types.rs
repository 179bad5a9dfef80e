//! Native value representation.
//!
//! Every registered type declares one `RepresentationKind`; a typed value's
//! payload is the matching `NativeValue` variant. Structural payloads hold one
//! entry per element (arrays) or field (rows), each possibly null.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationKind {
    Boolean,
    Integer,
    Float,
    VarBytes,
    Structural,
}

impl fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepresentationKind::Boolean => "boolean",
            RepresentationKind::Integer => "integer",
            RepresentationKind::Float => "float",
            RepresentationKind::VarBytes => "var_bytes",
            RepresentationKind::Structural => "structural",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NativeValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Structural(Vec<Option<NativeValue>>),
}

impl NativeValue {
    pub fn kind(&self) -> RepresentationKind {
        match self {
            NativeValue::Boolean(_) => RepresentationKind::Boolean,
            NativeValue::Integer(_) => RepresentationKind::Integer,
            NativeValue::Float(_) => RepresentationKind::Float,
            NativeValue::Bytes(_) => RepresentationKind::VarBytes,
            NativeValue::Structural(_) => RepresentationKind::Structural,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            NativeValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_elements(&self) -> Option<&[Option<NativeValue>]> {
        match self {
            NativeValue::Structural(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for NativeValue {
    fn from(v: bool) -> Self {
        NativeValue::Boolean(v)
    }
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        NativeValue::Integer(v)
    }
}

impl From<i32> for NativeValue {
    fn from(v: i32) -> Self {
        NativeValue::Integer(v as i64)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::Float(v)
    }
}

impl From<&str> for NativeValue {
    fn from(v: &str) -> Self {
        NativeValue::Bytes(v.as_bytes().to_vec())
    }
}

impl From<String> for NativeValue {
    fn from(v: String) -> Self {
        NativeValue::Bytes(v.into_bytes())
    }
}

impl From<Vec<u8>> for NativeValue {
    fn from(v: Vec<u8>) -> Self {
        NativeValue::Bytes(v)
    }
}

impl From<Vec<Option<NativeValue>>> for NativeValue {
    fn from(v: Vec<Option<NativeValue>>) -> Self {
        NativeValue::Structural(v)
    }
}
