//! JSON literals to native values.
//!
//! `null` is a null value. Strings are UTF-8 bytes, except for hex-formatted
//! types (`varbinary`) where they are hex digits, optionally space-separated.
//! Arrays and rows are JSON arrays.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use typedval_core::{Formatter, NativeValue, RepresentationKind, Structure, TypeDescriptor};

pub fn parse_literal(ty: &TypeDescriptor, text: &str) -> Result<Option<NativeValue>> {
    let json: Value =
        serde_json::from_str(text).with_context(|| format!("value is not valid JSON: {text}"))?;
    json_to_native(ty, &json)
}

pub fn json_to_native(ty: &TypeDescriptor, json: &Value) -> Result<Option<NativeValue>> {
    if json.is_null() {
        return Ok(None);
    }
    let expected = |what: &str| anyhow!("type {} expects {what}, got {json}", ty.signature());
    let value = match (ty.structure(), ty.kind()) {
        (Some(Structure::Array(element)), _) => {
            let items = json.as_array().ok_or_else(|| expected("a JSON array"))?;
            NativeValue::Structural(
                items
                    .iter()
                    .map(|item| json_to_native(element, item))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        (Some(Structure::Row(fields)), _) => {
            let items = json.as_array().ok_or_else(|| expected("a JSON array"))?;
            if items.len() != fields.len() {
                bail!(
                    "type {} has {} fields, literal has {}",
                    ty.signature(),
                    fields.len(),
                    items.len()
                );
            }
            NativeValue::Structural(
                fields
                    .iter()
                    .zip(items)
                    .map(|(field, item)| json_to_native(field, item))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        (None, RepresentationKind::Boolean) => {
            NativeValue::Boolean(json.as_bool().ok_or_else(|| expected("a boolean"))?)
        }
        (None, RepresentationKind::Integer) => {
            NativeValue::Integer(json.as_i64().ok_or_else(|| expected("an integer"))?)
        }
        (None, RepresentationKind::Float) => {
            NativeValue::Float(json.as_f64().ok_or_else(|| expected("a number"))?)
        }
        (None, RepresentationKind::VarBytes) => {
            let s = json.as_str().ok_or_else(|| expected("a string"))?;
            if ty.formatter() == Formatter::Hex {
                NativeValue::Bytes(parse_hex(s)?)
            } else {
                NativeValue::from(s)
            }
        }
        (None, RepresentationKind::Structural) => {
            bail!("structural type {} has no parameters", ty.signature())
        }
    };
    Ok(Some(value))
}

fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        bail!("hex literal {s:?} has an odd number of digits");
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|_| anyhow!("bad hex digits in {s:?}"))?;
            u8::from_str_radix(text, 16).with_context(|| format!("bad hex digits {text:?}"))
        })
        .collect()
}
