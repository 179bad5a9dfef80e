//! TypedValue <-> single position of a columnar block.
//!
//! Encoding per representation:
//! - boolean: 1 byte, `0` / `1`
//! - integer: little-endian two's complement truncated to the type's width
//! - float: `f32` bits for width 4, `f64` bits for width 8
//! - bytes: one variable-width entry
//! - array / row: child blocks, written recursively

use typedval_core::prelude::{
    Block, BlockBuilder, Error, NativeValue, RepresentationKind, Result, Structure, Type,
    TypeDescriptor,
};
use typedval_operators::OperatorRegistry;

use crate::value::TypedValue;

/// Length-one block holding `value`'s native representation or a null.
pub fn to_block(value: &TypedValue) -> Result<Block> {
    native_to_block(value.get_type(), value.native_value())
}

/// Build a length-one block for `value` of type `ty`.
pub fn native_to_block(ty: &TypeDescriptor, value: Option<&NativeValue>) -> Result<Block> {
    if let Some(v) = value {
        ty.check_representation(v)?;
    }
    let mut builder = BlockBuilder::for_type(ty)?;
    write_native(ty, value, &mut builder)?;
    Ok(builder.build())
}

/// Read position `position` of `block` as a `TypedValue` of type `ty`.
pub fn from_block(
    ops: &OperatorRegistry,
    ty: Type,
    block: &Block,
    position: usize,
) -> Result<TypedValue> {
    let value = read_native(&ty, block, position)?;
    TypedValue::new(ops, ty, value)
}

/// Append one position to `out`. The builder must have been created for `ty`.
pub fn write_native(
    ty: &TypeDescriptor,
    value: Option<&NativeValue>,
    out: &mut BlockBuilder,
) -> Result<()> {
    let Some(value) = value else {
        out.append_null();
        return Ok(());
    };
    match (value, ty.structure()) {
        (NativeValue::Boolean(b), None) => out.append_fixed(&[u8::from(*b)]),
        (NativeValue::Integer(v), None) => {
            let width = fixed_width(ty, 8)?;
            out.append_fixed(&v.to_le_bytes()[..width])
        }
        (NativeValue::Float(v), None) => match fixed_width(ty, 8)? {
            4 => out.append_fixed(&(*v as f32).to_le_bytes()),
            _ => out.append_fixed(&v.to_le_bytes()),
        },
        (NativeValue::Bytes(bytes), None) => out.append_variable(bytes),
        (NativeValue::Structural(items), Some(Structure::Array(element))) => {
            let child = out.array_elements()?;
            for item in items {
                write_native(element, item.as_ref(), child)?;
            }
            out.close_array_entry()
        }
        (NativeValue::Structural(items), Some(Structure::Row(fields))) => {
            if items.len() != fields.len() {
                return Err(mismatch(
                    ty,
                    value,
                    format!("row has {} fields, value has {}", fields.len(), items.len()),
                ));
            }
            let children = out.row_fields()?;
            for ((item, field), child) in items.iter().zip(fields).zip(children.iter_mut()) {
                write_native(field, item.as_ref(), child)?;
            }
            out.close_row_entry()
        }
        _ => Err(mismatch(
            ty,
            value,
            format!("expected {} representation", ty.kind()),
        )),
    }
}

/// Decode position `position` of `block` as `ty`'s native representation;
/// `None` for a null position.
pub fn read_native(
    ty: &TypeDescriptor,
    block: &Block,
    position: usize,
) -> Result<Option<NativeValue>> {
    check_layout(ty, block)?;
    if block.is_null(position)? {
        return Ok(None);
    }
    let value = match (ty.kind(), ty.structure()) {
        (RepresentationKind::Boolean, _) => match block.fixed_slice(position)? {
            [0] => NativeValue::Boolean(false),
            [1] => NativeValue::Boolean(true),
            other => {
                return Err(Error::CorruptBlock(format!(
                    "boolean byte {other:?} at position {position}"
                )))
            }
        },
        (RepresentationKind::Integer, _) => {
            NativeValue::Integer(sign_extend(block.fixed_slice(position)?))
        }
        (RepresentationKind::Float, _) => {
            let bytes = block.fixed_slice(position)?;
            let corrupt = || Error::CorruptBlock(format!("float of {} bytes", bytes.len()));
            match bytes.len() {
                4 => NativeValue::Float(f64::from(f32::from_le_bytes(
                    bytes.try_into().map_err(|_| corrupt())?,
                ))),
                8 => NativeValue::Float(f64::from_le_bytes(
                    bytes.try_into().map_err(|_| corrupt())?,
                )),
                _ => return Err(corrupt()),
            }
        }
        (RepresentationKind::VarBytes, _) => {
            NativeValue::Bytes(block.variable_slice(position)?.to_vec())
        }
        (RepresentationKind::Structural, Some(Structure::Array(element))) => {
            let (range, elements) = block.array_range(position)?;
            NativeValue::Structural(
                range
                    .map(|i| read_native(element, elements, i))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        (RepresentationKind::Structural, Some(Structure::Row(fields))) => {
            let blocks = block.row_fields()?;
            NativeValue::Structural(
                fields
                    .iter()
                    .zip(blocks)
                    .map(|(field, b)| read_native(field, b, position))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        (RepresentationKind::Structural, None) => {
            return Err(Error::Config(format!(
                "structural type {} has no parameters",
                ty.signature()
            )))
        }
    };
    Ok(Some(value))
}

fn check_layout(ty: &TypeDescriptor, block: &Block) -> Result<()> {
    let ok = match (ty.kind(), ty.structure(), block) {
        (RepresentationKind::VarBytes, _, Block::VariableWidth { .. }) => true,
        (_, Some(Structure::Array(_)), Block::Array { .. }) => true,
        (_, Some(Structure::Row(fields)), Block::Row { fields: blocks, .. }) => {
            fields.len() == blocks.len()
        }
        (
            RepresentationKind::Boolean | RepresentationKind::Integer | RepresentationKind::Float,
            None,
            Block::FixedWidth { width, .. },
        ) => ty.fixed_width() == Some(*width),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            type_signature: ty.signature().to_string(),
            value: format!("{} block", block.layout()),
            reason: "block layout does not match the type's representation".into(),
        })
    }
}

fn fixed_width(ty: &TypeDescriptor, max: usize) -> Result<usize> {
    match ty.fixed_width() {
        Some(w) if w <= max => Ok(w),
        other => Err(Error::Config(format!(
            "type {} has unusable fixed width {other:?}",
            ty.signature()
        ))),
    }
}

fn sign_extend(bytes: &[u8]) -> i64 {
    let negative = bytes.last().is_some_and(|b| b & 0x80 != 0);
    let mut buf = if negative { [0xffu8; 8] } else { [0u8; 8] };
    let n = bytes.len().min(8);
    buf[..n].copy_from_slice(&bytes[..n]);
    i64::from_le_bytes(buf)
}

fn mismatch(ty: &TypeDescriptor, value: &NativeValue, reason: String) -> Error {
    Error::TypeMismatch {
        type_signature: ty.signature().to_string(),
        value: format!("{value:?}"),
        reason,
    }
}

impl TypedValue {
    /// Length-one block for this value; see [`to_block`].
    pub fn as_block(&self) -> Result<Block> {
        to_block(self)
    }

    pub fn from_block(
        ops: &OperatorRegistry,
        ty: Type,
        block: &Block,
        position: usize,
    ) -> Result<Self> {
        from_block(ops, ty, block, position)
    }
}
