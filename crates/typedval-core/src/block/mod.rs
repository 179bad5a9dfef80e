//! Columnar blocks used to ship values across process boundaries.
//!
//! Four layouts cover every representation kind:
//! - `FixedWidth`: booleans, integers, floats; `width` bytes per position.
//! - `VariableWidth`: byte strings addressed by `positions + 1` offsets.
//! - `Array`: per-position ranges into a child element block.
//! - `Row`: one child block per field, all with the row's position count.
//!
//! A null position still occupies space (zeroed fixed bytes, an empty
//! range), so offsets stay monotone and row children stay aligned.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod builder;
pub mod codec;

pub use builder::BlockBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum Block {
    FixedWidth {
        width: usize,
        data: Vec<u8>,
        nulls: Option<Vec<bool>>,
    },
    VariableWidth {
        offsets: Vec<u32>,
        data: Vec<u8>,
        nulls: Option<Vec<bool>>,
    },
    Array {
        offsets: Vec<u32>,
        elements: Box<Block>,
        nulls: Option<Vec<bool>>,
    },
    Row {
        positions: usize,
        fields: Vec<Block>,
        nulls: Option<Vec<bool>>,
    },
}

impl Block {
    /// Short layout name for diagnostics.
    pub fn layout(&self) -> &'static str {
        match self {
            Block::FixedWidth { .. } => "fixed_width",
            Block::VariableWidth { .. } => "variable_width",
            Block::Array { .. } => "array",
            Block::Row { .. } => "row",
        }
    }

    pub fn position_count(&self) -> usize {
        match self {
            Block::FixedWidth { width, data, .. } => {
                if *width == 0 {
                    0
                } else {
                    data.len() / width
                }
            }
            Block::VariableWidth { offsets, .. } | Block::Array { offsets, .. } => {
                offsets.len().saturating_sub(1)
            }
            Block::Row { positions, .. } => *positions,
        }
    }

    fn nulls(&self) -> Option<&[bool]> {
        match self {
            Block::FixedWidth { nulls, .. }
            | Block::VariableWidth { nulls, .. }
            | Block::Array { nulls, .. }
            | Block::Row { nulls, .. } => nulls.as_deref(),
        }
    }

    pub fn is_null(&self, position: usize) -> Result<bool> {
        self.check_position(position)?;
        Ok(self
            .nulls()
            .and_then(|n| n.get(position).copied())
            .unwrap_or(false))
    }

    /// Raw bytes of one fixed-width position.
    pub fn fixed_slice(&self, position: usize) -> Result<&[u8]> {
        self.check_position(position)?;
        match self {
            Block::FixedWidth { width, data, .. } => {
                let start = position * width;
                Ok(&data[start..start + width])
            }
            other => Err(Error::CorruptBlock(format!(
                "fixed_slice on {} block",
                other.layout()
            ))),
        }
    }

    /// Raw bytes of one variable-width position.
    pub fn variable_slice(&self, position: usize) -> Result<&[u8]> {
        self.check_position(position)?;
        match self {
            Block::VariableWidth { offsets, data, .. } => {
                let range = offset_range(offsets, position)?;
                data.get(range).ok_or_else(|| {
                    Error::CorruptBlock(format!("offsets at {position} exceed data length"))
                })
            }
            other => Err(Error::CorruptBlock(format!(
                "variable_slice on {} block",
                other.layout()
            ))),
        }
    }

    /// Element range of one array position plus the element block.
    pub fn array_range(&self, position: usize) -> Result<(Range<usize>, &Block)> {
        self.check_position(position)?;
        match self {
            Block::Array {
                offsets, elements, ..
            } => {
                let range = offset_range(offsets, position)?;
                if range.end > elements.position_count() {
                    return Err(Error::CorruptBlock(format!(
                        "array offsets at {position} exceed element count"
                    )));
                }
                Ok((range, elements))
            }
            other => Err(Error::CorruptBlock(format!(
                "array_range on {} block",
                other.layout()
            ))),
        }
    }

    pub fn row_fields(&self) -> Result<&[Block]> {
        match self {
            Block::Row { fields, .. } => Ok(fields),
            other => Err(Error::CorruptBlock(format!(
                "row_fields on {} block",
                other.layout()
            ))),
        }
    }

    /// Check internal consistency, recursively.
    pub fn validate(&self) -> Result<()> {
        let positions = self.position_count();
        if let Some(nulls) = self.nulls() {
            if nulls.len() != positions {
                return Err(Error::CorruptBlock(format!(
                    "{} block has {} positions but {} null flags",
                    self.layout(),
                    positions,
                    nulls.len()
                )));
            }
        }
        match self {
            Block::FixedWidth { width, data, .. } => {
                if *width == 0 || data.len() % width != 0 {
                    return Err(Error::CorruptBlock(format!(
                        "fixed-width data length {} is not a multiple of width {}",
                        data.len(),
                        width
                    )));
                }
            }
            Block::VariableWidth { offsets, data, .. } => {
                check_offsets(offsets, data.len())?;
            }
            Block::Array {
                offsets, elements, ..
            } => {
                check_offsets(offsets, elements.position_count())?;
                elements.validate()?;
            }
            Block::Row { fields, .. } => {
                if fields.is_empty() {
                    return Err(Error::CorruptBlock("row block without fields".into()));
                }
                for (i, field) in fields.iter().enumerate() {
                    if field.position_count() != positions {
                        return Err(Error::CorruptBlock(format!(
                            "row field {i} has {} positions, row has {positions}",
                            field.position_count()
                        )));
                    }
                    field.validate()?;
                }
            }
        }
        Ok(())
    }

    fn check_position(&self, position: usize) -> Result<()> {
        let count = self.position_count();
        if position >= count {
            return Err(Error::CorruptBlock(format!(
                "position {position} out of range for {} block with {count} positions",
                self.layout()
            )));
        }
        Ok(())
    }
}

fn offset_range(offsets: &[u32], position: usize) -> Result<Range<usize>> {
    let start = offsets[position] as usize;
    let end = offsets[position + 1] as usize;
    if end < start {
        return Err(Error::CorruptBlock(format!(
            "offsets decrease at position {position}"
        )));
    }
    Ok(start..end)
}

fn check_offsets(offsets: &[u32], limit: usize) -> Result<()> {
    if offsets.is_empty() || offsets[0] != 0 {
        return Err(Error::CorruptBlock("offsets must start at 0".into()));
    }
    if offsets.windows(2).any(|w| w[1] < w[0]) {
        return Err(Error::CorruptBlock("offsets are not monotone".into()));
    }
    let last = *offsets.last().unwrap_or(&0) as usize;
    if last != limit {
        return Err(Error::CorruptBlock(format!(
            "last offset {last} does not match child length {limit}"
        )));
    }
    Ok(())
}
