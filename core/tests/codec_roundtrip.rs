//! End-to-end codec tests: exact wire layouts across classic and
//! flexible versions, forward compatibility, and the per-message codec
//! contract composed over the generic engine.

use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use bytes::{Buf, Bytes, BytesMut};
use fluxwire::{
    decode_message, encode_message_to_bytes, primitive, CodecError, FieldSpec, MessageSchema,
    MessageValue, SchemaCatalog, WireKind, WireMessage, WireValue,
};

/// Schema used by the wire-layout scenarios below: one positional
/// int32 `x`, one optional tagged string `note`, flexible from v2.
fn probe_schema() -> MessageSchema {
    let mut schema = MessageSchema {
        api_key: 99,
        name: "Probe".to_string(),
        min_version: 0,
        max_version: 3,
        flexible_versions_from: 2,
        fields: vec![
            FieldSpec {
                name: "x".to_string(),
                kind: WireKind::Int32,
                min_version: 0,
                max_version: i16::MAX,
                tag: None,
            },
            FieldSpec {
                name: "note".to_string(),
                kind: WireKind::String { nullable: true },
                min_version: 0,
                max_version: i16::MAX,
                tag: Some(0),
            },
        ],
    };
    schema.validate().unwrap();
    schema
}

#[test]
fn flexible_message_with_tagged_string_layout() {
    // x=42 positional, note="hello" as tag 0. The tagged record is
    // tag id, payload byte length, then the compact string payload.
    let schema = probe_schema();
    let value = MessageValue::new()
        .with("x", WireValue::Int32(42))
        .with("note", WireValue::NullableString(Some("hello".to_string())));

    let bytes = encode_message_to_bytes(&schema, &value, 2).unwrap();
    assert_eq!(
        bytes.as_ref(),
        &[
            0x00, 0x00, 0x00, 0x2A, // x = 42
            0x01, // tagged section: one record
            0x00, // tag id 0
            0x06, // payload length 6
            0x06, b'h', b'e', b'l', b'l', b'o', // compact string "hello"
        ]
    );

    let mut cursor = Cursor::new(bytes.as_ref());
    let decoded = decode_message(&schema, &mut cursor, 2).unwrap();
    assert_eq!(decoded.get_int32("x"), Some(42));
    assert_eq!(decoded.get_string("note"), Some("hello"));
    assert_eq!(cursor.remaining(), 0);
}

#[test]
fn flexible_message_with_tag_absent_layout() {
    let schema = probe_schema();
    let value = MessageValue::new()
        .with("x", WireValue::Int32(42))
        .with("note", WireValue::NullableString(None));

    let bytes = encode_message_to_bytes(&schema, &value, 2).unwrap();
    // Positional int32 followed by an empty tagged section.
    assert_eq!(bytes.as_ref(), &[0x00, 0x00, 0x00, 0x2A, 0x00]);

    let mut cursor = Cursor::new(bytes.as_ref());
    let decoded = decode_message(&schema, &mut cursor, 2).unwrap();
    assert_eq!(decoded.get_int32("x"), Some(42));
    assert_eq!(decoded.get("note"), Some(&WireValue::NullableString(None)));
}

#[test]
fn classic_version_ignores_tagged_fields() {
    let schema = probe_schema();
    let value = MessageValue::new()
        .with("x", WireValue::Int32(42))
        .with("note", WireValue::NullableString(Some("hello".to_string())));

    let bytes = encode_message_to_bytes(&schema, &value, 0).unwrap();
    // Only the positional int32; no tagged section bytes at all.
    assert_eq!(bytes.as_ref(), &[0x00, 0x00, 0x00, 0x2A]);

    let mut cursor = Cursor::new(bytes.as_ref());
    let decoded = decode_message(&schema, &mut cursor, 0).unwrap();
    assert_eq!(decoded.get_int32("x"), Some(42));
    assert_eq!(decoded.get("note"), Some(&WireValue::NullableString(None)));
}

#[test]
fn version_gating_rejects_out_of_range() {
    let schema = probe_schema();
    let value = MessageValue::new().with("x", WireValue::Int32(1));

    for version in [-1, 4] {
        assert!(matches!(
            encode_message_to_bytes(&schema, &value, version),
            Err(CodecError::UnsupportedVersion { api_key: 99, .. })
        ));
        let empty: &[u8] = &[];
        let mut cursor = Cursor::new(empty);
        assert!(matches!(
            decode_message(&schema, &mut cursor, version),
            Err(CodecError::UnsupportedVersion { api_key: 99, .. })
        ));
    }

    for version in schema.min_version..=schema.max_version {
        encode_message_to_bytes(&schema, &value, version).unwrap();
    }
}

#[test]
fn unknown_tag_from_newer_writer_is_skipped() {
    // Hand-build a flexible frame carrying tag 57 (unknown to the
    // schema) ahead of the known tag 0. The reader must hop over the
    // unknown payload via its length prefix and still land on tag 0.
    let schema = probe_schema();
    let mut buf = BytesMut::new();
    primitive::write_int32(&mut buf, 42);
    primitive::write_unsigned_varint(&mut buf, 2); // two tagged records

    primitive::write_unsigned_varint(&mut buf, 57);
    let unknown_payload = b"\xDE\xAD\xBE\xEF";
    primitive::write_unsigned_varint(&mut buf, unknown_payload.len() as u32);
    buf.extend_from_slice(unknown_payload);

    primitive::write_unsigned_varint(&mut buf, 0);
    let mut note = BytesMut::new();
    primitive::write_compact_nullable_string(&mut note, Some("hi"));
    primitive::write_unsigned_varint(&mut buf, note.len() as u32);
    buf.extend_from_slice(&note);

    let mut cursor = Cursor::new(buf.as_ref());
    let decoded = decode_message(&schema, &mut cursor, 2).unwrap();
    assert_eq!(decoded.get_int32("x"), Some(42));
    assert_eq!(decoded.get_string("note"), Some("hi"));
    assert_eq!(cursor.remaining(), 0);
}

#[test]
fn null_and_empty_are_distinct_in_both_forms() {
    let mut schema = MessageSchema {
        api_key: 7,
        name: "NullProbe".to_string(),
        min_version: 0,
        max_version: 1,
        flexible_versions_from: 1,
        fields: vec![
            FieldSpec {
                name: "s".to_string(),
                kind: WireKind::String { nullable: true },
                min_version: 0,
                max_version: i16::MAX,
                tag: None,
            },
            FieldSpec {
                name: "items".to_string(),
                kind: WireKind::Array {
                    element: Box::new(WireKind::Int8),
                    nullable: true,
                },
                min_version: 0,
                max_version: i16::MAX,
                tag: None,
            },
        ],
    };
    schema.validate().unwrap();

    for version in 0..=1 {
        for (s, items) in [
            (None, None),
            (Some(String::new()), Some(vec![])),
            (Some("x".to_string()), Some(vec![WireValue::Int8(3)])),
        ] {
            let value = MessageValue::new()
                .with("s", WireValue::NullableString(s.clone()))
                .with("items", WireValue::NullableArray(items.clone()));
            let bytes = encode_message_to_bytes(&schema, &value, version).unwrap();
            let mut cursor = Cursor::new(bytes.as_ref());
            let decoded = decode_message(&schema, &mut cursor, version).unwrap();
            assert_eq!(decoded.get("s"), Some(&WireValue::NullableString(s)));
            assert_eq!(decoded.get("items"), Some(&WireValue::NullableArray(items)));
        }
    }

    // Classic wire distinguishes null (-1) from empty (0) explicitly.
    let null_value = MessageValue::new()
        .with("s", WireValue::NullableString(None))
        .with("items", WireValue::NullableArray(None));
    let bytes = encode_message_to_bytes(&schema, &null_value, 0).unwrap();
    assert_eq!(bytes.as_ref(), &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn compact_array_null_marker_rejected_when_not_nullable() {
    let mut schema = MessageSchema {
        api_key: 8,
        name: "ArrayProbe".to_string(),
        min_version: 0,
        max_version: 0,
        flexible_versions_from: 0,
        fields: vec![FieldSpec {
            name: "items".to_string(),
            kind: WireKind::Array {
                element: Box::new(WireKind::Int32),
                nullable: false,
            },
            min_version: 0,
            max_version: i16::MAX,
            tag: None,
        }],
    };
    schema.validate().unwrap();

    // A compact length prefix of 0 is the null marker.
    let wire = [0x00u8, 0x00];
    let mut cursor = Cursor::new(&wire[..]);
    assert!(matches!(
        decode_message(&schema, &mut cursor, 0),
        Err(CodecError::InvalidLength(0))
    ));
}

#[test]
fn truncated_input_reports_typed_error() {
    let schema = probe_schema();
    let wire = [0x00u8, 0x00]; // half an int32
    let mut cursor = Cursor::new(&wire[..]);
    assert!(matches!(
        decode_message(&schema, &mut cursor, 0),
        Err(CodecError::Truncated { needed: 4, available: 2 })
    ));
}

#[test]
fn catalog_shared_across_threads() {
    let catalog =
        Arc::new(SchemaCatalog::from_schemas(vec![probe_schema()]).unwrap());
    let schema = Arc::clone(catalog.get(99).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = Arc::clone(&schema);
            std::thread::spawn(move || {
                for version in schema.min_version..=schema.max_version {
                    let value = MessageValue::new()
                        .with("x", WireValue::Int32(i))
                        .with("note", WireValue::NullableString(Some(format!("t{}", i))));
                    let bytes = encode_message_to_bytes(&schema, &value, version).unwrap();
                    let mut cursor = Cursor::new(bytes.as_ref());
                    let decoded = decode_message(&schema, &mut cursor, version).unwrap();
                    assert_eq!(decoded.get_int32("x"), Some(i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

// ----------------------------------------------------------------------------
// WireMessage contract: a concrete message type instantiated over the
// generic engine, the way the generated catalog layer applies it.
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct ProbeRequest {
    x: i32,
    note: Option<String>,
}

impl ProbeRequest {
    fn schema() -> &'static MessageSchema {
        static SCHEMA: OnceLock<MessageSchema> = OnceLock::new();
        SCHEMA.get_or_init(probe_schema)
    }
}

impl WireMessage for ProbeRequest {
    const API_KEY: i16 = 99;

    fn header_version(version: i16) -> i16 {
        if version >= Self::schema().flexible_versions_from {
            2
        } else {
            1
        }
    }

    fn encode(&self, version: i16) -> fluxwire::Result<Bytes> {
        let value = MessageValue::new()
            .with("x", WireValue::Int32(self.x))
            .with("note", WireValue::NullableString(self.note.clone()));
        encode_message_to_bytes(Self::schema(), &value, version)
    }

    fn decode(buf: &mut impl Buf, version: i16) -> fluxwire::Result<Self> {
        let value = decode_message(Self::schema(), buf, version)?;
        Ok(Self {
            x: value.get_int32("x").unwrap_or_default(),
            note: value.get_string("note").map(str::to_string),
        })
    }
}

#[test]
fn wire_message_contract_roundtrip() {
    let request = ProbeRequest {
        x: 42,
        note: Some("hello".to_string()),
    };

    for version in 0..=3 {
        let bytes = request.encode(version).unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let decoded = ProbeRequest::decode(&mut cursor, version).unwrap();

        assert_eq!(decoded.x, 42);
        if version >= 2 {
            // Tagged note only travels on flexible versions.
            assert_eq!(decoded.note.as_deref(), Some("hello"));
        } else {
            assert_eq!(decoded.note, None);
        }
    }

    assert_eq!(ProbeRequest::API_KEY, 99);
    assert_eq!(ProbeRequest::header_version(0), 1);
    assert_eq!(ProbeRequest::header_version(2), 2);
}
