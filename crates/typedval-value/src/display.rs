//! Human-readable rendering.
//!
//! Scalars go straight through their type's formatter. Structural values are
//! rendered from their block form, so display sees exactly what goes over the
//! wire: arrays as `[a, b]`, rows as `(a, b)`, nulls as `NULL`.

use typedval_core::prelude::{Block, Error, Result, Structure, TypeDescriptor};

use crate::bridge::{read_native, to_block};
use crate::value::TypedValue;

pub const NULL_DISPLAY: &str = "NULL";

impl TypedValue {
    pub fn to_display_string(&self) -> Result<String> {
        let mut out = String::new();
        match self.native_value() {
            None => out.push_str(NULL_DISPLAY),
            Some(value) if self.get_type().structure().is_none() => {
                self.get_type()
                    .format_scalar(value, self.display_max_bytes(), &mut out)?;
            }
            Some(_) => {
                let block = to_block(self)?;
                render(self.get_type(), &block, 0, self.display_max_bytes(), &mut out)?;
            }
        }
        Ok(out)
    }
}

/// Render position `position` of `block` as type `ty` into `out`.
pub fn render(
    ty: &TypeDescriptor,
    block: &Block,
    position: usize,
    max_bytes: usize,
    out: &mut String,
) -> Result<()> {
    match ty.structure() {
        None => match read_native(ty, block, position)? {
            None => out.push_str(NULL_DISPLAY),
            Some(value) => ty.format_scalar(&value, max_bytes, out)?,
        },
        Some(_) if block.is_null(position)? => out.push_str(NULL_DISPLAY),
        Some(Structure::Array(element)) => {
            let (range, elements) = block.array_range(position)?;
            out.push('[');
            for (n, i) in range.enumerate() {
                if n > 0 {
                    out.push_str(", ");
                }
                render(element, elements, i, max_bytes, out)?;
            }
            out.push(']');
        }
        Some(Structure::Row(fields)) => {
            let blocks = block.row_fields()?;
            if blocks.len() != fields.len() {
                return Err(Error::CorruptBlock(format!(
                    "row block has {} fields, type {} has {}",
                    blocks.len(),
                    ty.signature(),
                    fields.len()
                )));
            }
            out.push('(');
            for (n, (field, b)) in fields.iter().zip(blocks).enumerate() {
                if n > 0 {
                    out.push_str(", ");
                }
                render(field, b, position, max_bytes, out)?;
            }
            out.push(')');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use typedval_core::{NativeValue, TypeRegistry, TypeSystemConfig};
    use typedval_operators::OperatorRegistry;

    fn ops(display_max_bytes: usize) -> OperatorRegistry {
        let config = TypeSystemConfig {
            extra_types: vec!["array(varchar)".into(), "row(bigint, date)".into()],
            display_max_bytes,
        };
        OperatorRegistry::new(Arc::new(TypeRegistry::bootstrap(&config).unwrap()))
    }

    fn show(ops: &OperatorRegistry, sig: &str, value: Option<NativeValue>) -> String {
        let ty = ops.types().describe(sig).unwrap();
        TypedValue::new(ops, ty, value)
            .unwrap()
            .to_display_string()
            .unwrap()
    }

    #[test]
    fn scalars_use_their_formatter() {
        let ops = ops(256);
        assert_eq!(show(&ops, "boolean", Some(true.into())), "true");
        assert_eq!(show(&ops, "date", Some(NativeValue::Integer(0))), "1970-01-01");
        assert_eq!(show(&ops, "double", Some(2.5f64.into())), "2.5");
        assert_eq!(show(&ops, "varbinary", Some(vec![0xde_u8, 0xad].into())), "de ad");
        assert_eq!(show(&ops, "hyperloglog", Some(vec![1u8].into())), "<hyperloglog>");
        assert_eq!(show(&ops, "bigint", None), "NULL");
    }

    #[test]
    fn structural_values_render_from_blocks() {
        let ops = ops(256);
        let arr = NativeValue::Structural(vec![Some("a".into()), None, Some("c".into())]);
        assert_eq!(show(&ops, "array(varchar)", Some(arr)), "[a, NULL, c]");
        let row = NativeValue::Structural(vec![Some(NativeValue::Integer(7)), Some(NativeValue::Integer(365))]);
        assert_eq!(show(&ops, "row(bigint, date)", Some(row)), "(7, 1971-01-01)");
        assert_eq!(show(&ops, "array(varchar)", Some(NativeValue::Structural(vec![]))), "[]");
    }

    #[test]
    fn long_varchar_is_truncated() {
        let ops = ops(4);
        assert_eq!(show(&ops, "varchar", Some("abcdefgh".into())), "abcd…");
        assert_eq!(show(&ops, "varchar", Some("abcd".into())), "abcd");
    }
}
