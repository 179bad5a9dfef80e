//! Incremental block construction.

use crate::descriptor::{Structure, TypeDescriptor};
use crate::error::{Error, Result};
use crate::types::RepresentationKind;

use super::Block;

#[derive(Debug, Clone)]
pub enum BlockBuilder {
    FixedWidth {
        width: usize,
        data: Vec<u8>,
        nulls: Vec<bool>,
    },
    VariableWidth {
        offsets: Vec<u32>,
        data: Vec<u8>,
        nulls: Vec<bool>,
    },
    Array {
        offsets: Vec<u32>,
        elements: Box<BlockBuilder>,
        nulls: Vec<bool>,
    },
    Row {
        positions: usize,
        fields: Vec<BlockBuilder>,
        nulls: Vec<bool>,
    },
}

impl BlockBuilder {
    pub fn fixed_width(width: usize) -> Self {
        BlockBuilder::FixedWidth {
            width,
            data: Vec::new(),
            nulls: Vec::new(),
        }
    }

    pub fn variable_width() -> Self {
        BlockBuilder::VariableWidth {
            offsets: vec![0],
            data: Vec::new(),
            nulls: Vec::new(),
        }
    }

    pub fn array(elements: BlockBuilder) -> Self {
        BlockBuilder::Array {
            offsets: vec![0],
            elements: Box::new(elements),
            nulls: Vec::new(),
        }
    }

    pub fn row(fields: Vec<BlockBuilder>) -> Self {
        BlockBuilder::Row {
            positions: 0,
            fields,
            nulls: Vec::new(),
        }
    }

    /// Builder with the layout `ty` serializes to.
    pub fn for_type(ty: &TypeDescriptor) -> Result<Self> {
        match (ty.kind(), ty.structure()) {
            (RepresentationKind::Boolean, _)
            | (RepresentationKind::Integer, _)
            | (RepresentationKind::Float, _) => ty.fixed_width().map(Self::fixed_width).ok_or_else(|| {
                Error::Config(format!("type {} has no fixed width", ty.signature()))
            }),
            (RepresentationKind::VarBytes, _) => Ok(Self::variable_width()),
            (RepresentationKind::Structural, Some(Structure::Array(elem))) => {
                Ok(Self::array(Self::for_type(elem)?))
            }
            (RepresentationKind::Structural, Some(Structure::Row(fields))) => {
                let fields = fields
                    .iter()
                    .map(|f| Self::for_type(f))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::row(fields))
            }
            (RepresentationKind::Structural, None) => Err(Error::Config(format!(
                "structural type {} has no parameters",
                ty.signature()
            ))),
        }
    }

    pub fn position_count(&self) -> usize {
        match self {
            BlockBuilder::FixedWidth { nulls, .. }
            | BlockBuilder::VariableWidth { nulls, .. }
            | BlockBuilder::Array { nulls, .. }
            | BlockBuilder::Row { nulls, .. } => nulls.len(),
        }
    }

    pub fn append_fixed(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            BlockBuilder::FixedWidth { width, data, nulls } if bytes.len() == *width => {
                data.extend_from_slice(bytes);
                nulls.push(false);
                Ok(())
            }
            BlockBuilder::FixedWidth { width, .. } => Err(Error::CorruptBlock(format!(
                "expected {width} bytes, got {}",
                bytes.len()
            ))),
            other => Err(other.misuse("append_fixed")),
        }
    }

    pub fn append_variable(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            BlockBuilder::VariableWidth {
                offsets,
                data,
                nulls,
            } => {
                data.extend_from_slice(bytes);
                offsets.push(to_offset(data.len())?);
                nulls.push(false);
                Ok(())
            }
            other => Err(other.misuse("append_variable")),
        }
    }

    /// Child builder that receives the elements of the array being written.
    /// Finish the entry with [`close_array_entry`](Self::close_array_entry).
    pub fn array_elements(&mut self) -> Result<&mut BlockBuilder> {
        match self {
            BlockBuilder::Array { elements, .. } => Ok(elements.as_mut()),
            other => Err(other.misuse("array_elements")),
        }
    }

    pub fn close_array_entry(&mut self) -> Result<()> {
        match self {
            BlockBuilder::Array {
                offsets,
                elements,
                nulls,
            } => {
                offsets.push(to_offset(elements.position_count())?);
                nulls.push(false);
                Ok(())
            }
            other => Err(other.misuse("close_array_entry")),
        }
    }

    /// Child builders, one per field; write exactly one position into each,
    /// then call [`close_row_entry`](Self::close_row_entry).
    pub fn row_fields(&mut self) -> Result<&mut [BlockBuilder]> {
        match self {
            BlockBuilder::Row { fields, .. } => Ok(fields.as_mut_slice()),
            other => Err(other.misuse("row_fields")),
        }
    }

    pub fn close_row_entry(&mut self) -> Result<()> {
        match self {
            BlockBuilder::Row {
                positions,
                fields,
                nulls,
            } => {
                let expected = *positions + 1;
                if let Some(i) = fields.iter().position(|f| f.position_count() != expected) {
                    return Err(Error::CorruptBlock(format!(
                        "row field {i} has {} positions, expected {expected}",
                        fields[i].position_count()
                    )));
                }
                *positions = expected;
                nulls.push(false);
                Ok(())
            }
            other => Err(other.misuse("close_row_entry")),
        }
    }

    pub fn append_null(&mut self) {
        match self {
            BlockBuilder::FixedWidth { width, data, nulls } => {
                data.resize(data.len() + *width, 0);
                nulls.push(true);
            }
            BlockBuilder::VariableWidth { offsets, nulls, .. }
            | BlockBuilder::Array { offsets, nulls, .. } => {
                let last = offsets.last().copied().unwrap_or(0);
                offsets.push(last);
                nulls.push(true);
            }
            BlockBuilder::Row {
                positions,
                fields,
                nulls,
            } => {
                for field in fields.iter_mut() {
                    field.append_null();
                }
                *positions += 1;
                nulls.push(true);
            }
        }
    }

    pub fn build(self) -> Block {
        fn mask(nulls: Vec<bool>) -> Option<Vec<bool>> {
            nulls.iter().any(|n| *n).then_some(nulls)
        }
        match self {
            BlockBuilder::FixedWidth { width, data, nulls } => Block::FixedWidth {
                width,
                data,
                nulls: mask(nulls),
            },
            BlockBuilder::VariableWidth {
                offsets,
                data,
                nulls,
            } => Block::VariableWidth {
                offsets,
                data,
                nulls: mask(nulls),
            },
            BlockBuilder::Array {
                offsets,
                elements,
                nulls,
            } => Block::Array {
                offsets,
                elements: Box::new(elements.build()),
                nulls: mask(nulls),
            },
            BlockBuilder::Row {
                positions,
                fields,
                nulls,
            } => Block::Row {
                positions,
                fields: fields.into_iter().map(BlockBuilder::build).collect(),
                nulls: mask(nulls),
            },
        }
    }

    fn misuse(&self, op: &str) -> Error {
        let layout = match self {
            BlockBuilder::FixedWidth { .. } => "fixed_width",
            BlockBuilder::VariableWidth { .. } => "variable_width",
            BlockBuilder::Array { .. } => "array",
            BlockBuilder::Row { .. } => "row",
        };
        Error::CorruptBlock(format!("{op} on {layout} builder"))
    }
}

fn to_offset(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::CorruptBlock(format!("block offset {len} exceeds u32")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_positions_keep_layout_aligned() {
        let mut b = BlockBuilder::variable_width();
        b.append_variable(b"ab").unwrap();
        b.append_null();
        b.append_variable(b"c").unwrap();
        let block = b.build();
        block.validate().unwrap();
        assert_eq!(block.position_count(), 3);
        assert!(block.is_null(1).unwrap());
        assert_eq!(block.variable_slice(2).unwrap(), b"c");
    }

    #[test]
    fn all_valid_positions_drop_the_null_mask() {
        let mut b = BlockBuilder::fixed_width(1);
        b.append_fixed(&[1]).unwrap();
        assert!(matches!(b.build(), Block::FixedWidth { nulls: None, .. }));
    }

    #[test]
    fn row_entries_require_every_field() {
        let mut b = BlockBuilder::row(vec![BlockBuilder::fixed_width(8), BlockBuilder::variable_width()]);
        b.row_fields().unwrap()[0].append_fixed(&7i64.to_le_bytes()).unwrap();
        assert!(b.close_row_entry().is_err());
        b.row_fields().unwrap()[1].append_variable(b"x").unwrap();
        b.close_row_entry().unwrap();
        b.append_null();
        let block = b.build();
        block.validate().unwrap();
        assert_eq!(block.position_count(), 2);
        assert!(block.row_fields().unwrap()[1].is_null(1).unwrap());
    }

    #[test]
    fn wrong_width_is_rejected() {
        let mut b = BlockBuilder::fixed_width(4);
        assert!(b.append_fixed(&[0; 8]).is_err());
        assert!(b.append_variable(b"x").is_err());
    }
}
