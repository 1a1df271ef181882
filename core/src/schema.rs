//! Message Schemas and Version Policy
//!
//! A [`MessageSchema`] is the declarative description of one message
//! type: its api key, supported version range, the version at which it
//! switches to the flexible (compact + tagged) wire form, and an ordered
//! field list. Schemas are plain data loaded once from the external
//! catalog and never mutated; every wire-form decision is a pure
//! function of the requested version.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::value::WireValue;

/// The wire type of one field, mirroring [`WireValue`] variants. Array
/// kinds carry their element kind; nullability is part of the kind so
/// null handling stays explicit end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Bool,
    String { nullable: bool },
    Bytes { nullable: bool },
    Uuid,
    Array { element: Box<WireKind>, nullable: bool },
}

impl WireKind {
    /// The type-appropriate zero value, used for fields whose version
    /// range does not include the decoded version.
    pub fn default_value(&self) -> WireValue {
        match self {
            WireKind::Int8 => WireValue::Int8(0),
            WireKind::Int16 => WireValue::Int16(0),
            WireKind::Int32 => WireValue::Int32(0),
            WireKind::Int64 => WireValue::Int64(0),
            WireKind::Bool => WireValue::Bool(false),
            WireKind::String { nullable: false } => WireValue::String(String::new()),
            WireKind::String { nullable: true } => WireValue::NullableString(None),
            WireKind::Bytes { nullable: false } => WireValue::Bytes(bytes::Bytes::new()),
            WireKind::Bytes { nullable: true } => WireValue::NullableBytes(None),
            WireKind::Uuid => WireValue::Uuid([0u8; 16]),
            WireKind::Array { nullable: false, .. } => WireValue::Array(Vec::new()),
            WireKind::Array { nullable: true, .. } => WireValue::NullableArray(None),
        }
    }
}

/// One field of a message schema.
///
/// A field is present at version `v` iff `min_version <= v <= max_version`.
/// Fields with a tag id are carried only in the trailing tagged section
/// (never positionally) for every version where they are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: WireKind,
    pub min_version: i16,
    #[serde(default = "FieldSpec::open_ended")]
    pub max_version: i16,
    #[serde(default)]
    pub tag: Option<u32>,
}

impl FieldSpec {
    fn open_ended() -> i16 {
        i16::MAX
    }

    pub fn is_present(&self, version: i16) -> bool {
        version >= self.min_version && version <= self.max_version
    }

    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }
}

/// Wire form selected by the version policy for one encode/decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireForm {
    /// Fixed-width length prefixes, no tagged section.
    Classic,
    /// Compact (varint) length prefixes plus a trailing tagged section,
    /// always written even when empty.
    Flexible,
}

/// Immutable schema for one message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSchema {
    pub api_key: i16,
    pub name: String,
    pub min_version: i16,
    pub max_version: i16,
    /// First version that uses the flexible wire form. A value above
    /// `max_version` means the message never goes flexible.
    pub flexible_versions_from: i16,
    pub fields: Vec<FieldSpec>,
}

impl MessageSchema {
    pub fn supports_version(&self, version: i16) -> bool {
        version >= self.min_version && version <= self.max_version
    }

    /// Resolves the wire form for `version`, failing with
    /// [`CodecError::UnsupportedVersion`] outside the supported range.
    /// Purely a function of the version; no negotiation state lives in
    /// the codec.
    pub fn wire_form(&self, version: i16) -> Result<WireForm> {
        if !self.supports_version(version) {
            return Err(CodecError::UnsupportedVersion {
                api_key: self.api_key,
                version,
            });
        }
        if version >= self.flexible_versions_from {
            Ok(WireForm::Flexible)
        } else {
            Ok(WireForm::Classic)
        }
    }

    /// Positional fields valid at `version`, in schema-declared order.
    pub fn positional_fields(&self, version: i16) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(move |f| !f.is_tagged() && f.is_present(version))
    }

    /// Tag-bearing fields valid at `version`, in ascending tag order.
    /// Relies on the sort performed by [`MessageSchema::validate`].
    pub fn tagged_fields(&self, version: i16) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(move |f| f.is_tagged() && f.is_present(version))
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks structural invariants and normalizes field order so that
    /// tagged fields sort by ascending tag id (stable wire output).
    /// Called once at catalog load.
    pub fn validate(&mut self) -> Result<()> {
        if self.min_version > self.max_version {
            return Err(CodecError::InvalidSchema(format!(
                "{}: inverted version range {}..{}",
                self.name, self.min_version, self.max_version
            )));
        }

        let mut seen_tags = std::collections::HashSet::new();
        for field in &self.fields {
            if field.min_version > field.max_version {
                return Err(CodecError::InvalidSchema(format!(
                    "{}.{}: inverted field version range {}..{}",
                    self.name, field.name, field.min_version, field.max_version
                )));
            }
            if let Some(tag) = field.tag {
                if !seen_tags.insert(tag) {
                    return Err(CodecError::InvalidSchema(format!(
                        "{}: duplicate tag id {}",
                        self.name, tag
                    )));
                }
            }
        }

        // Positional order is schema-declared; only the relative order
        // of tagged fields is normalized.
        self.fields
            .sort_by_key(|f| match f.tag {
                None => (0, 0),
                Some(tag) => (1, tag),
            });
        Ok(())
    }
}
