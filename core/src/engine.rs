//! Schema-Driven Codec Engine
//!
//! One interpreter walks a [`MessageSchema`] and applies the primitive
//! codec and tagged-field section to a [`MessageValue`], replacing the
//! per-message classic/flexible branching that concrete message types
//! would otherwise each hand-roll. Message types stay declarative data;
//! this is the only place that knows how a version maps onto the wire.
//!
//! Encode and decode are stateless and synchronous. Any number of calls
//! may run concurrently over shared `Arc` schemas as long as each call
//! owns its buffers.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::{CodecError, Result};
use crate::primitive;
use crate::schema::{FieldSpec, MessageSchema, WireForm, WireKind};
use crate::tagged::{read_tagged_section, write_tagged_section, TaggedField};
use crate::value::{MessageValue, WireValue};

/// Encodes one message body at `version` into `buf`.
///
/// An unsupported version fails before any byte is written. Classic
/// versions emit every in-range positional field in schema order and
/// nothing else; flexible versions emit compact positional fields
/// followed by the tagged section (count 0 when no tagged field
/// qualifies). Fields absent from `value` encode as their kind's
/// default.
pub fn encode_message(
    schema: &MessageSchema,
    value: &MessageValue,
    version: i16,
    buf: &mut BytesMut,
) -> Result<()> {
    let form = schema.wire_form(version)?;

    for field in schema.positional_fields(version) {
        match value.get(&field.name) {
            Some(v) => encode_value(field, v, form, buf)?,
            None => encode_value(field, &field.kind.default_value(), form, buf)?,
        }
    }

    if form == WireForm::Flexible {
        let mut tags: Vec<TaggedField> = Vec::new();
        for field in schema.tagged_fields(version) {
            if let Some(v) = value.get(&field.name) {
                if v.is_tag_present() {
                    let mut payload = BytesMut::new();
                    encode_value(field, v, WireForm::Flexible, &mut payload)?;
                    tags.push(TaggedField {
                        tag: field.tag.unwrap_or_default(),
                        data: payload.freeze(),
                    });
                }
            }
        }
        write_tagged_section(buf, &tags)?;
    }

    Ok(())
}

/// Convenience wrapper producing a standalone byte sequence.
pub fn encode_message_to_bytes(
    schema: &MessageSchema,
    value: &MessageValue,
    version: i16,
) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    encode_message(schema, value, version, &mut buf)?;
    Ok(buf.freeze())
}

/// Decodes one message body at `version`.
///
/// Every schema field appears in the result: fields outside the
/// version's range (and tagged fields absent from the wire) come back as
/// their kind's default, so the observable field set depends only on the
/// schema. Unknown tag ids are skipped, not reported; duplicate tags
/// resolve last-wins in wire order.
pub fn decode_message(
    schema: &MessageSchema,
    buf: &mut impl Buf,
    version: i16,
) -> Result<MessageValue> {
    let form = schema.wire_form(version)?;

    let mut value: MessageValue = schema
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.kind.default_value()))
        .collect();

    for field in schema.positional_fields(version) {
        value.set(field.name.clone(), decode_value(field, form, buf)?);
    }

    if form == WireForm::Flexible {
        for raw in read_tagged_section(buf)? {
            match schema.tagged_fields(version).find(|f| f.tag == Some(raw.tag)) {
                Some(field) => {
                    let mut payload = raw.data;
                    let decoded = decode_value(field, WireForm::Flexible, &mut payload)?;
                    // A known tag's payload is fully defined by its kind;
                    // leftover bytes mean the writer and this schema have
                    // desynchronized.
                    if payload.has_remaining() {
                        return Err(CodecError::InvalidEncoding(format!(
                            "tagged field {} left {} undecoded payload bytes",
                            field.name,
                            payload.remaining()
                        )));
                    }
                    value.set(field.name.clone(), decoded);
                }
                None => {
                    // Forward-compatibility noise from a newer writer;
                    // the length prefix already carried us past it.
                    debug!(
                        message = %schema.name,
                        tag = raw.tag,
                        len = raw.data.len(),
                        "skipping unknown tagged field"
                    );
                }
            }
        }
    }

    Ok(value)
}

fn mismatch(field: &FieldSpec, value: &WireValue) -> CodecError {
    CodecError::InvalidSchema(format!(
        "field {}: value {:?} does not match kind {:?}",
        field.name, value, field.kind
    ))
}

fn encode_value(
    field: &FieldSpec,
    value: &WireValue,
    form: WireForm,
    buf: &mut impl BufMut,
) -> Result<()> {
    encode_leaf(field, &field.kind, value, form, buf)
}

fn encode_leaf(
    field: &FieldSpec,
    kind: &WireKind,
    value: &WireValue,
    form: WireForm,
    buf: &mut impl BufMut,
) -> Result<()> {
    match (kind, value) {
        (WireKind::Int8, WireValue::Int8(v)) => primitive::write_int8(buf, *v),
        (WireKind::Int16, WireValue::Int16(v)) => primitive::write_int16(buf, *v),
        (WireKind::Int32, WireValue::Int32(v)) => primitive::write_int32(buf, *v),
        (WireKind::Int64, WireValue::Int64(v)) => primitive::write_int64(buf, *v),
        (WireKind::Bool, WireValue::Bool(v)) => primitive::write_bool(buf, *v),
        (WireKind::Uuid, WireValue::Uuid(v)) => primitive::write_uuid(buf, v),
        (WireKind::String { nullable: false }, WireValue::String(s)) => match form {
            WireForm::Classic => primitive::write_string(buf, s)?,
            WireForm::Flexible => primitive::write_compact_string(buf, s),
        },
        (WireKind::String { nullable: true }, WireValue::NullableString(s)) => match form {
            WireForm::Classic => primitive::write_nullable_string(buf, s.as_deref())?,
            WireForm::Flexible => primitive::write_compact_nullable_string(buf, s.as_deref()),
        },
        (WireKind::Bytes { nullable: false }, WireValue::Bytes(b)) => match form {
            WireForm::Classic => primitive::write_bytes(buf, b)?,
            WireForm::Flexible => primitive::write_compact_bytes(buf, b),
        },
        (WireKind::Bytes { nullable: true }, WireValue::NullableBytes(b)) => match form {
            WireForm::Classic => primitive::write_nullable_bytes(buf, b.as_deref())?,
            WireForm::Flexible => primitive::write_compact_nullable_bytes(buf, b.as_deref()),
        },
        (WireKind::Array { element, nullable: false }, WireValue::Array(items)) => {
            match form {
                WireForm::Classic => primitive::write_array_len(buf, items.len())?,
                WireForm::Flexible => primitive::write_compact_array_len(buf, items.len()),
            }
            for item in items {
                encode_leaf(field, element.as_ref(), item, form, buf)?;
            }
        }
        (WireKind::Array { element, nullable: true }, WireValue::NullableArray(items)) => {
            match items {
                None => match form {
                    WireForm::Classic => primitive::write_null_array_len(buf),
                    WireForm::Flexible => primitive::write_compact_null_array_len(buf),
                },
                Some(items) => {
                    match form {
                        WireForm::Classic => primitive::write_array_len(buf, items.len())?,
                        WireForm::Flexible => primitive::write_compact_array_len(buf, items.len()),
                    }
                    for item in items {
                        encode_leaf(field, element.as_ref(), item, form, buf)?;
                    }
                }
            }
        }
        (_, value) => return Err(mismatch(field, value)),
    }
    Ok(())
}

fn decode_value(field: &FieldSpec, form: WireForm, buf: &mut impl Buf) -> Result<WireValue> {
    decode_leaf(&field.kind, form, buf)
}

fn decode_leaf(kind: &WireKind, form: WireForm, buf: &mut impl Buf) -> Result<WireValue> {
    Ok(match kind {
        WireKind::Int8 => WireValue::Int8(primitive::read_int8(buf)?),
        WireKind::Int16 => WireValue::Int16(primitive::read_int16(buf)?),
        WireKind::Int32 => WireValue::Int32(primitive::read_int32(buf)?),
        WireKind::Int64 => WireValue::Int64(primitive::read_int64(buf)?),
        WireKind::Bool => WireValue::Bool(primitive::read_bool(buf)?),
        WireKind::Uuid => WireValue::Uuid(primitive::read_uuid(buf)?),
        WireKind::String { nullable: false } => WireValue::String(match form {
            WireForm::Classic => primitive::read_string(buf)?,
            WireForm::Flexible => primitive::read_compact_string(buf)?,
        }),
        WireKind::String { nullable: true } => WireValue::NullableString(match form {
            WireForm::Classic => primitive::read_nullable_string(buf)?,
            WireForm::Flexible => primitive::read_compact_nullable_string(buf)?,
        }),
        WireKind::Bytes { nullable: false } => WireValue::Bytes(match form {
            WireForm::Classic => primitive::read_bytes(buf)?,
            WireForm::Flexible => primitive::read_compact_bytes(buf)?,
        }),
        WireKind::Bytes { nullable: true } => WireValue::NullableBytes(match form {
            WireForm::Classic => primitive::read_nullable_bytes(buf)?,
            WireForm::Flexible => primitive::read_compact_nullable_bytes(buf)?,
        }),
        WireKind::Array { element, nullable: false } => {
            let len = match form {
                WireForm::Classic => primitive::read_array_len(buf)?,
                WireForm::Flexible => primitive::read_compact_array_len(buf)?,
            };
            WireValue::Array(decode_elements(element.as_ref(), form, buf, len)?)
        }
        WireKind::Array { element, nullable: true } => {
            let len = match form {
                WireForm::Classic => primitive::read_nullable_array_len(buf)?,
                WireForm::Flexible => primitive::read_compact_nullable_array_len(buf)?,
            };
            WireValue::NullableArray(match len {
                None => None,
                Some(len) => Some(decode_elements(element.as_ref(), form, buf, len)?),
            })
        }
    })
}

fn decode_elements(
    element: &WireKind,
    form: WireForm,
    buf: &mut impl Buf,
    len: usize,
) -> Result<Vec<WireValue>> {
    // Cap the upfront allocation; a lying count still fails on read.
    let mut items = Vec::with_capacity(len.min(1024));
    for _ in 0..len {
        items.push(decode_leaf(element, form, buf)?);
    }
    Ok(items)
}

/// The per-message-type codec contract.
///
/// Concrete message types are mechanical instantiations of the engine:
/// they expose the constants the routing/dispatch layer needs (api key
/// and header version) and delegate the wire work to
/// [`encode_message`]/[`decode_message`] through their schema.
pub trait WireMessage: Sized {
    const API_KEY: i16;

    /// Version of the envelope wrapping this body at a given body
    /// version. Header layout itself is the dispatch layer's concern.
    fn header_version(version: i16) -> i16;

    fn encode(&self, version: i16) -> Result<Bytes>;

    fn decode(buf: &mut impl Buf, version: i16) -> Result<Self>;
}
