//! # FluxWire Core Library
//!
//! FluxWire is the versioned binary wire-protocol codec framework used
//! for client/broker and broker/broker RPC in a Kafka-compatible
//! messaging system. It serializes and deserializes message fields; it
//! interprets no message semantics and performs no network I/O.
//!
//! ## Features
//!
//! - **Dual wire forms**: every leaf type encodes classically
//!   (fixed-width length prefixes, `-1` = null) and compactly
//!   (varint `length + 1` prefixes, `0` = null), selected per message
//!   version by the flexible-version threshold
//! - **Tagged field extension**: trailing `(tag, length, payload)`
//!   records let schemas grow without relayout; unknown tags from newer
//!   writers are skipped byte-for-byte
//! - **Schema-driven engine**: one interpreter walks declarative
//!   [`MessageSchema`] tables instead of hand-written classic/flexible
//!   branching per message type
//! - **Version policy**: per-message supported ranges and per-field
//!   version gating, resolved as a pure function of the requested
//!   version
//! - **Stateless concurrency**: schemas are read-only after catalog
//!   load; every encode/decode call owns its buffers and may run on any
//!   thread
//!
//! ## Architecture Overview
//!
//! - [`primitive`] - leaf encoders/decoders in both wire forms
//! - [`tagged`] - the trailing tagged-field section
//! - [`schema`] - field specs, message schemas, version policy
//! - [`engine`] - the generic schema-driven encode/decode
//! - [`catalog`] - loading and sharing the generated schema catalog
//! - [`frame`] - length-prefixed framing for byte streams
//!
//! ## Quick Start
//!
//! ```rust
//! use fluxwire::{
//!     decode_message, encode_message_to_bytes, FieldSpec, MessageSchema,
//!     MessageValue, WireKind, WireValue,
//! };
//!
//! let mut schema = MessageSchema {
//!     api_key: 42,
//!     name: "Example".to_string(),
//!     min_version: 0,
//!     max_version: 2,
//!     flexible_versions_from: 1,
//!     fields: vec![FieldSpec {
//!         name: "x".to_string(),
//!         kind: WireKind::Int32,
//!         min_version: 0,
//!         max_version: i16::MAX,
//!         tag: None,
//!     }],
//! };
//! schema.validate()?;
//!
//! let value = MessageValue::new().with("x", WireValue::Int32(7));
//! let bytes = encode_message_to_bytes(&schema, &value, 1)?;
//! let decoded = decode_message(&schema, &mut bytes.clone(), 1)?;
//! assert_eq!(decoded.get_int32("x"), Some(7));
//! # Ok::<(), fluxwire::CodecError>(())
//! ```

pub mod catalog;
pub mod engine;
pub mod error;
pub mod frame;
pub mod primitive;
pub mod schema;
pub mod tagged;
pub mod value;

pub use catalog::{ApiVersionRange, SchemaCatalog};
pub use engine::{decode_message, encode_message, encode_message_to_bytes, WireMessage};
pub use error::{CodecError, Result};
pub use frame::FrameCodec;
pub use schema::{FieldSpec, MessageSchema, WireForm, WireKind};
pub use tagged::TaggedField;
pub use value::{MessageValue, WireValue};
