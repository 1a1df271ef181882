//! Primitive Wire Codec
//!
//! Leaf-value encoders and decoders shared by every message schema.
//! All fixed-width integers are network byte order (big-endian). Each
//! variable-length type comes in two wire forms:
//!
//! - **classic**: fixed-width length prefixes (`int16` for strings,
//!   `int32` for bytes and arrays), with `-1` denoting null;
//! - **compact**: unsigned-varint `length + 1` prefixes, with `0`
//!   denoting null, used by flexible message versions.
//!
//! Readers check `remaining()` before every fixed-size access and fail
//! with [`CodecError::Truncated`] instead of panicking. Input already
//! consumed before a failure is not restored; callers must treat any
//! error as terminal for the message being decoded.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{CodecError, Result};

/// Maximum encoded length of an unsigned 32-bit varint.
const MAX_VARINT_BYTES: usize = 5;

#[inline]
fn ensure(buf: &impl Buf, needed: usize) -> Result<()> {
    let available = buf.remaining();
    if available < needed {
        return Err(CodecError::Truncated { needed, available });
    }
    Ok(())
}

fn take_vec(buf: &mut impl Buf, len: usize) -> Result<Vec<u8>> {
    ensure(buf, len)?;
    let mut out = vec![0u8; len];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

// ----------------------------------------------------------------------------
// Fixed-width integers and booleans (identical in both wire forms)
// ----------------------------------------------------------------------------

pub fn write_int8(buf: &mut impl BufMut, v: i8) {
    buf.put_i8(v);
}

pub fn write_int16(buf: &mut impl BufMut, v: i16) {
    buf.put_i16(v);
}

pub fn write_int32(buf: &mut impl BufMut, v: i32) {
    buf.put_i32(v);
}

pub fn write_int64(buf: &mut impl BufMut, v: i64) {
    buf.put_i64(v);
}

pub fn read_int8(buf: &mut impl Buf) -> Result<i8> {
    ensure(buf, 1)?;
    Ok(buf.get_i8())
}

pub fn read_int16(buf: &mut impl Buf) -> Result<i16> {
    ensure(buf, 2)?;
    Ok(buf.get_i16())
}

pub fn read_int32(buf: &mut impl Buf) -> Result<i32> {
    ensure(buf, 4)?;
    Ok(buf.get_i32())
}

pub fn read_int64(buf: &mut impl Buf) -> Result<i64> {
    ensure(buf, 8)?;
    Ok(buf.get_i64())
}

/// Writer always emits 0 or 1.
pub fn write_bool(buf: &mut impl BufMut, v: bool) {
    buf.put_u8(v as u8);
}

/// Any nonzero byte reads as true.
pub fn read_bool(buf: &mut impl Buf) -> Result<bool> {
    ensure(buf, 1)?;
    Ok(buf.get_u8() != 0)
}

// ----------------------------------------------------------------------------
// Varints
// ----------------------------------------------------------------------------

/// Writes an unsigned varint: base-128 little-endian groups with a
/// continuation bit in the high bit of each byte.
pub fn write_unsigned_varint(buf: &mut impl BufMut, mut v: u32) {
    while v & !0x7F != 0 {
        buf.put_u8((v & 0x7F) as u8 | 0x80);
        v >>= 7;
    }
    buf.put_u8(v as u8);
}

/// Reads an unsigned varint. More than five encoded bytes for a 32-bit
/// value is [`CodecError::MalformedVarint`].
pub fn read_unsigned_varint(buf: &mut impl Buf) -> Result<u32> {
    let mut value = 0u32;
    for i in 0..MAX_VARINT_BYTES {
        ensure(buf, 1)?;
        let byte = buf.get_u8();
        value |= ((byte & 0x7F) as u32) << (i * 7);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::MalformedVarint)
}

/// Writes a signed varint using zigzag mapping over the unsigned form.
pub fn write_varint(buf: &mut impl BufMut, v: i32) {
    write_unsigned_varint(buf, ((v << 1) ^ (v >> 31)) as u32);
}

pub fn read_varint(buf: &mut impl Buf) -> Result<i32> {
    let n = read_unsigned_varint(buf)?;
    Ok(((n >> 1) as i32) ^ -((n & 1) as i32))
}

// ----------------------------------------------------------------------------
// 128-bit identifiers
// ----------------------------------------------------------------------------

/// 16 raw bytes, both halves already in network order.
pub fn write_uuid(buf: &mut impl BufMut, v: &[u8; 16]) {
    buf.put_slice(v);
}

pub fn read_uuid(buf: &mut impl Buf) -> Result<[u8; 16]> {
    ensure(buf, 16)?;
    let mut out = [0u8; 16];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

// ----------------------------------------------------------------------------
// Strings
// ----------------------------------------------------------------------------

pub fn write_string(buf: &mut impl BufMut, s: &str) -> Result<()> {
    if s.len() > i16::MAX as usize {
        return Err(CodecError::InvalidLength(s.len() as i64));
    }
    buf.put_i16(s.len() as i16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

pub fn write_nullable_string(buf: &mut impl BufMut, s: Option<&str>) -> Result<()> {
    match s {
        Some(s) => write_string(buf, s),
        None => {
            buf.put_i16(-1);
            Ok(())
        }
    }
}

fn string_from_utf8(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|e| CodecError::InvalidEncoding(format!("invalid UTF-8: {}", e)))
}

/// Classic non-nullable string: a length of -1 is a decode error.
pub fn read_string(buf: &mut impl Buf) -> Result<String> {
    let len = read_int16(buf)?;
    if len < 0 {
        return Err(CodecError::InvalidLength(len as i64));
    }
    string_from_utf8(take_vec(buf, len as usize)?)
}

pub fn read_nullable_string(buf: &mut impl Buf) -> Result<Option<String>> {
    let len = read_int16(buf)?;
    if len == -1 {
        return Ok(None);
    }
    if len < -1 {
        return Err(CodecError::InvalidLength(len as i64));
    }
    Ok(Some(string_from_utf8(take_vec(buf, len as usize)?)?))
}

pub fn write_compact_string(buf: &mut impl BufMut, s: &str) {
    write_unsigned_varint(buf, s.len() as u32 + 1);
    buf.put_slice(s.as_bytes());
}

pub fn write_compact_nullable_string(buf: &mut impl BufMut, s: Option<&str>) {
    match s {
        Some(s) => write_compact_string(buf, s),
        None => buf.put_u8(0),
    }
}

/// Compact non-nullable string: a raw length prefix of 0 (the null
/// marker) is a decode error.
pub fn read_compact_string(buf: &mut impl Buf) -> Result<String> {
    let n = read_unsigned_varint(buf)?;
    if n == 0 {
        return Err(CodecError::InvalidLength(0));
    }
    string_from_utf8(take_vec(buf, n as usize - 1)?)
}

pub fn read_compact_nullable_string(buf: &mut impl Buf) -> Result<Option<String>> {
    let n = read_unsigned_varint(buf)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(string_from_utf8(take_vec(buf, n as usize - 1)?)?))
}

// ----------------------------------------------------------------------------
// Byte sequences
// ----------------------------------------------------------------------------

pub fn write_bytes(buf: &mut impl BufMut, b: &[u8]) -> Result<()> {
    if b.len() > i32::MAX as usize {
        return Err(CodecError::InvalidLength(b.len() as i64));
    }
    buf.put_i32(b.len() as i32);
    buf.put_slice(b);
    Ok(())
}

pub fn write_nullable_bytes(buf: &mut impl BufMut, b: Option<&[u8]>) -> Result<()> {
    match b {
        Some(b) => write_bytes(buf, b),
        None => {
            buf.put_i32(-1);
            Ok(())
        }
    }
}

pub fn read_bytes(buf: &mut impl Buf) -> Result<Bytes> {
    let len = read_int32(buf)?;
    if len < 0 {
        return Err(CodecError::InvalidLength(len as i64));
    }
    Ok(Bytes::from(take_vec(buf, len as usize)?))
}

pub fn read_nullable_bytes(buf: &mut impl Buf) -> Result<Option<Bytes>> {
    let len = read_int32(buf)?;
    if len == -1 {
        return Ok(None);
    }
    if len < -1 {
        return Err(CodecError::InvalidLength(len as i64));
    }
    Ok(Some(Bytes::from(take_vec(buf, len as usize)?)))
}

pub fn write_compact_bytes(buf: &mut impl BufMut, b: &[u8]) {
    write_unsigned_varint(buf, b.len() as u32 + 1);
    buf.put_slice(b);
}

pub fn write_compact_nullable_bytes(buf: &mut impl BufMut, b: Option<&[u8]>) {
    match b {
        Some(b) => write_compact_bytes(buf, b),
        None => buf.put_u8(0),
    }
}

pub fn read_compact_bytes(buf: &mut impl Buf) -> Result<Bytes> {
    let n = read_unsigned_varint(buf)?;
    if n == 0 {
        return Err(CodecError::InvalidLength(0));
    }
    Ok(Bytes::from(take_vec(buf, n as usize - 1)?))
}

pub fn read_compact_nullable_bytes(buf: &mut impl Buf) -> Result<Option<Bytes>> {
    let n = read_unsigned_varint(buf)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(Bytes::from(take_vec(buf, n as usize - 1)?)))
}

// ----------------------------------------------------------------------------
// Array length prefixes (element bodies are encoded by the caller)
// ----------------------------------------------------------------------------

pub fn write_array_len(buf: &mut impl BufMut, len: usize) -> Result<()> {
    if len > i32::MAX as usize {
        return Err(CodecError::InvalidLength(len as i64));
    }
    buf.put_i32(len as i32);
    Ok(())
}

pub fn write_null_array_len(buf: &mut impl BufMut) {
    buf.put_i32(-1);
}

/// Classic non-nullable array count: negative counts are a decode error.
pub fn read_array_len(buf: &mut impl Buf) -> Result<usize> {
    let len = read_int32(buf)?;
    if len < 0 {
        return Err(CodecError::InvalidLength(len as i64));
    }
    Ok(len as usize)
}

pub fn read_nullable_array_len(buf: &mut impl Buf) -> Result<Option<usize>> {
    let len = read_int32(buf)?;
    if len == -1 {
        return Ok(None);
    }
    if len < -1 {
        return Err(CodecError::InvalidLength(len as i64));
    }
    Ok(Some(len as usize))
}

pub fn write_compact_array_len(buf: &mut impl BufMut, len: usize) {
    write_unsigned_varint(buf, len as u32 + 1);
}

pub fn write_compact_null_array_len(buf: &mut impl BufMut) {
    buf.put_u8(0);
}

/// Compact non-nullable array count: the null marker (raw 0) is a
/// decode error.
pub fn read_compact_array_len(buf: &mut impl Buf) -> Result<usize> {
    let n = read_unsigned_varint(buf)?;
    if n == 0 {
        return Err(CodecError::InvalidLength(0));
    }
    Ok(n as usize - 1)
}

pub fn read_compact_nullable_array_len(buf: &mut impl Buf) -> Result<Option<usize>> {
    let n = read_unsigned_varint(buf)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(n as usize - 1))
}
