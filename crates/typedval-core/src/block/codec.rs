//! Compact binary encoding for blocks.
//!
//! Layout:
//! [ magic: u32 ][ version: u16 ][ block … ]
//!
//! block := [ layout: u8 ][ has_nulls: u8 ][ nulls: u32 count + u8 each ]?
//!          layout body (all integers little-endian u32):
//!   fixed_width:    width, data_len, data
//!   variable_width: offset_count, offsets…, data_len, data
//!   array:          offset_count, offsets…, block
//!   row:            positions, field_count, block…
//!
//! Decoding validates the result, so a decoded block is always consistent.

use crate::error::{Error, Result};

use super::Block;

pub const MAGIC: u32 = 0x4B42_5654; // "TVBK"
pub const VERSION: u16 = 1;
pub const HEADER_LEN: usize = 4 + 2;

const MAX_DEPTH: usize = 64;

const TAG_FIXED: u8 = 0;
const TAG_VARIABLE: u8 = 1;
const TAG_ARRAY: u8 = 2;
const TAG_ROW: u8 = 3;

impl Block {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN + 32);
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&VERSION.to_le_bytes());
        encode(self, &mut out)?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cur = Cursor { bytes, pos: 0 };
        let magic = cur.u32()?;
        let version = u16::from_le_bytes(cur.take(2)?.try_into().map_err(|_| short())?);
        if magic != MAGIC || version != VERSION {
            return Err(Error::CorruptBlock("bad magic/version".into()));
        }
        let block = decode(&mut cur, 0)?;
        if cur.pos != bytes.len() {
            return Err(Error::CorruptBlock(format!(
                "{} trailing bytes after block",
                bytes.len() - cur.pos
            )));
        }
        block.validate()?;
        Ok(block)
    }
}

fn encode(block: &Block, out: &mut Vec<u8>) -> Result<()> {
    let (tag, nulls) = match block {
        Block::FixedWidth { nulls, .. } => (TAG_FIXED, nulls),
        Block::VariableWidth { nulls, .. } => (TAG_VARIABLE, nulls),
        Block::Array { nulls, .. } => (TAG_ARRAY, nulls),
        Block::Row { nulls, .. } => (TAG_ROW, nulls),
    };
    out.push(tag);
    match nulls {
        None => out.push(0),
        Some(mask) => {
            out.push(1);
            put_len(out, mask.len())?;
            out.extend(mask.iter().map(|n| *n as u8));
        }
    }
    match block {
        Block::FixedWidth { width, data, .. } => {
            put_len(out, *width)?;
            put_len(out, data.len())?;
            out.extend_from_slice(data);
        }
        Block::VariableWidth { offsets, data, .. } => {
            put_offsets(out, offsets)?;
            put_len(out, data.len())?;
            out.extend_from_slice(data);
        }
        Block::Array {
            offsets, elements, ..
        } => {
            put_offsets(out, offsets)?;
            encode(elements, out)?;
        }
        Block::Row {
            positions, fields, ..
        } => {
            put_len(out, *positions)?;
            put_len(out, fields.len())?;
            for field in fields {
                encode(field, out)?;
            }
        }
    }
    Ok(())
}

fn decode(cur: &mut Cursor<'_>, depth: usize) -> Result<Block> {
    if depth > MAX_DEPTH {
        return Err(Error::CorruptBlock("block nesting too deep".into()));
    }
    let tag = cur.u8()?;
    let nulls = match cur.u8()? {
        0 => None,
        1 => {
            let n = cur.len()?;
            Some(cur.take(n)?.iter().map(|b| *b != 0).collect())
        }
        other => {
            return Err(Error::CorruptBlock(format!("bad null-mask flag {other}")));
        }
    };
    let block = match tag {
        TAG_FIXED => {
            let width = cur.len()?;
            let n = cur.len()?;
            Block::FixedWidth {
                width,
                data: cur.take(n)?.to_vec(),
                nulls,
            }
        }
        TAG_VARIABLE => {
            let offsets = cur.offsets()?;
            let n = cur.len()?;
            Block::VariableWidth {
                offsets,
                data: cur.take(n)?.to_vec(),
                nulls,
            }
        }
        TAG_ARRAY => {
            let offsets = cur.offsets()?;
            Block::Array {
                offsets,
                elements: Box::new(decode(cur, depth + 1)?),
                nulls,
            }
        }
        TAG_ROW => {
            let positions = cur.len()?;
            let count = cur.len()?;
            let mut fields = Vec::with_capacity(count.min(64));
            for _ in 0..count {
                fields.push(decode(cur, depth + 1)?);
            }
            Block::Row {
                positions,
                fields,
                nulls,
            }
        }
        other => return Err(Error::CorruptBlock(format!("unknown layout tag {other}"))),
    };
    Ok(block)
}

fn put_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let v = u32::try_from(len)
        .map_err(|_| Error::CorruptBlock(format!("length {len} exceeds u32")))?;
    out.extend_from_slice(&v.to_le_bytes());
    Ok(())
}

fn put_offsets(out: &mut Vec<u8>, offsets: &[u32]) -> Result<()> {
    put_len(out, offsets.len())?;
    for o in offsets {
        out.extend_from_slice(&o.to_le_bytes());
    }
    Ok(())
}

fn short() -> Error {
    Error::CorruptBlock("short input".into())
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or_else(short)?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(short)?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let raw: [u8; 4] = self.take(4)?.try_into().map_err(|_| short())?;
        Ok(u32::from_le_bytes(raw))
    }

    fn len(&mut self) -> Result<usize> {
        Ok(self.u32()? as usize)
    }

    fn offsets(&mut self) -> Result<Vec<u32>> {
        let n = self.len()?;
        // Bound the allocation by what the input can actually hold.
        if n > (self.bytes.len() - self.pos) / 4 {
            return Err(short());
        }
        (0..n).map(|_| self.u32()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;

    fn nested_block() -> Block {
        let mut b = BlockBuilder::array(BlockBuilder::variable_width());
        {
            let elems = b.array_elements().unwrap();
            elems.append_variable(b"x").unwrap();
            elems.append_null();
        }
        b.close_array_entry().unwrap();
        b.append_null();
        b.build()
    }

    #[test]
    fn encoded_block_decodes_to_the_same_block() {
        let block = nested_block();
        let bytes = block.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &MAGIC.to_le_bytes());
        assert_eq!(Block::from_bytes(&bytes).unwrap(), block);
    }

    #[test]
    fn truncated_input_is_corrupt() {
        let bytes = nested_block().to_bytes().unwrap();
        for cut in [0, 3, HEADER_LEN, bytes.len() - 1] {
            assert!(
                matches!(Block::from_bytes(&bytes[..cut]), Err(Error::CorruptBlock(_))),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = nested_block().to_bytes().unwrap();
        bytes.push(0);
        assert!(Block::from_bytes(&bytes).is_err());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = nested_block().to_bytes().unwrap();
        bytes[0] ^= 0xff;
        assert!(Block::from_bytes(&bytes).is_err());
    }
}
