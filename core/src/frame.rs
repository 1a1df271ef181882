//! Message Framing
//!
//! Length-prefixed framing at the boundary between the codec and a byte
//! stream: every message travels as a 4-byte big-endian length followed
//! by the message bytes. The codec itself never touches sockets; this
//! is the `tokio_util` codec pair a transport plugs into.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::CodecError;

/// Upper bound on a single frame; anything larger is treated as stream
/// corruption rather than a legitimate message.
const MAX_FRAME_BYTES: i32 = 100_000_000;

pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        // Peek at the length without consuming it.
        let frame_len = {
            let mut cursor = Cursor::new(src.as_ref());
            cursor.get_i32()
        };

        if frame_len < 0 || frame_len > MAX_FRAME_BYTES {
            warn!(frame_len, "rejecting frame with invalid length prefix");
            return Err(CodecError::InvalidFrame(format!(
                "invalid frame length: {}",
                frame_len
            )));
        }

        let total_len = 4 + frame_len as usize;
        if src.len() < total_len {
            return Ok(None);
        }

        let mut frame = src.split_to(total_len);
        frame.advance(4);
        Ok(Some(frame.freeze()))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > MAX_FRAME_BYTES as usize {
            return Err(CodecError::InvalidFrame(format!(
                "frame too large: {} bytes",
                item.len()
            )));
        }
        dst.reserve(4 + item.len());
        dst.put_u32(item.len() as u32);
        dst.extend_from_slice(&item);
        Ok(())
    }
}
