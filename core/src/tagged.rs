//! Tagged Field Section
//!
//! Flexible message versions append an open-ended set of optional,
//! identified fields after the positional layout: a varint tag count,
//! then per tag a varint tag id, a varint payload byte length, and the
//! payload itself. The explicit per-tag byte length is what makes a tag
//! from a newer schema skippable byte-for-byte by an older reader, so it
//! is written unconditionally regardless of the payload's own type.
//!
//! This module deals in raw `(tag, bytes)` records; interpreting known
//! tags against a schema is the engine's job.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{CodecError, Result};
use crate::primitive::{read_unsigned_varint, write_unsigned_varint};

/// One raw record of the tagged section. `data` is the payload exactly
/// as carried on the wire, without the tag id or length prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedField {
    pub tag: u32,
    pub data: Bytes,
}

/// Writes a complete tagged section. Callers supply records in the
/// order they should appear on the wire; the engine passes them in
/// ascending tag order for stable output. An empty slice still writes
/// the section (a single zero count byte).
pub fn write_tagged_section(buf: &mut impl BufMut, fields: &[TaggedField]) -> Result<()> {
    write_unsigned_varint(buf, fields.len() as u32);
    for field in fields {
        write_unsigned_varint(buf, field.tag);
        if field.data.len() > u32::MAX as usize {
            return Err(CodecError::InvalidLength(field.data.len() as i64));
        }
        write_unsigned_varint(buf, field.data.len() as u32);
        buf.put_slice(&field.data);
    }
    Ok(())
}

/// Reads a complete tagged section into raw records, consuming every
/// payload byte. Unknown and out-of-order tags are not an error here;
/// the records come back in wire order for the caller to dispatch.
pub fn read_tagged_section(buf: &mut impl Buf) -> Result<Vec<TaggedField>> {
    let count = read_unsigned_varint(buf)?;
    let mut fields = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
        let tag = read_unsigned_varint(buf)?;
        let len = read_unsigned_varint(buf)? as usize;
        if buf.remaining() < len {
            return Err(CodecError::Truncated {
                needed: len,
                available: buf.remaining(),
            });
        }
        let data = buf.copy_to_bytes(len);
        fields.push(TaggedField { tag, data });
    }
    Ok(fields)
}
