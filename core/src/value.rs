//! Decoded Message Values
//!
//! [`WireValue`] is the typed leaf value carried by schema fields, and
//! [`MessageValue`] is the field-name keyed value graph produced by a
//! decode and consumed by an encode. Nullability is explicit in the
//! variant (`NullableString(Option<String>)` rather than a sentinel), so
//! null handling is exhaustive at compile time.

use std::collections::HashMap;

use bytes::Bytes;

/// A typed leaf value with exactly two serializations (classic and
/// compact) that decode to the same logical value.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Bool(bool),
    String(String),
    NullableString(Option<String>),
    Bytes(Bytes),
    NullableBytes(Option<Bytes>),
    Uuid([u8; 16]),
    Array(Vec<WireValue>),
    NullableArray(Option<Vec<WireValue>>),
}

impl WireValue {
    /// Whether a tag-bearing field carrying this value is written into
    /// the tagged section at all. Null values are omitted; empty byte
    /// sequences and arrays are omitted as well (an unset optional
    /// collection is not encoded as an empty tag). Empty strings are
    /// still written.
    pub(crate) fn is_tag_present(&self) -> bool {
        match self {
            WireValue::NullableString(None)
            | WireValue::NullableBytes(None)
            | WireValue::NullableArray(None) => false,
            WireValue::Bytes(b) => !b.is_empty(),
            WireValue::NullableBytes(Some(b)) => !b.is_empty(),
            WireValue::Array(items) => !items.is_empty(),
            WireValue::NullableArray(Some(items)) => !items.is_empty(),
            _ => true,
        }
    }
}

/// The decoded form of one message: field name to value.
///
/// Decoding materializes every schema field, substituting the kind's
/// default for fields outside the requested version's range, so two
/// decodes of the same bytes always expose the same field set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageValue {
    fields: HashMap<String, WireValue>,
}

impl MessageValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: WireValue) -> &mut Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: WireValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&WireValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_int32(&self, name: &str) -> Option<i32> {
        match self.fields.get(name) {
            Some(WireValue::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int64(&self, name: &str) -> Option<i64> {
        match self.fields.get(name) {
            Some(WireValue::Int64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.fields.get(name) {
            Some(WireValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(WireValue::String(s)) => Some(s.as_str()),
            Some(WireValue::NullableString(Some(s))) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_bytes(&self, name: &str) -> Option<&Bytes> {
        match self.fields.get(name) {
            Some(WireValue::Bytes(b)) => Some(b),
            Some(WireValue::NullableBytes(Some(b))) => Some(b),
            _ => None,
        }
    }

    pub fn get_array(&self, name: &str) -> Option<&[WireValue]> {
        match self.fields.get(name) {
            Some(WireValue::Array(items)) => Some(items.as_slice()),
            Some(WireValue::NullableArray(Some(items))) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl FromIterator<(String, WireValue)> for MessageValue {
    fn from_iter<I: IntoIterator<Item = (String, WireValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
