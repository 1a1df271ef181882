//! Codec Error Types
//!
//! Every decode failure surfaces as a typed [`CodecError`]; nothing is
//! retried inside the codec. The single deliberate exception is unknown
//! tagged fields during decode, which are skipped rather than reported
//! (they are valid forward-compatibility noise).

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported API version: key={api_key}, version={version}")]
    UnsupportedVersion { api_key: i16, version: i16 },

    #[error("Buffer underrun: needed {needed}, available {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Malformed varint: exceeds maximum encoded length")]
    MalformedVarint,

    #[error("Invalid length prefix: {0}")]
    InvalidLength(i64),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
