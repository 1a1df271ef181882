//! Schema Catalog
//!
//! The concrete message schemas are external, generated data. This
//! module loads that catalog once at process start, validates it, and
//! serves read-only `Arc` handles that may be shared freely across
//! concurrent encode/decode calls.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::schema::MessageSchema;

/// Supported version range advertised for one api key, the shape a
/// version-negotiation handshake exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersionRange {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

/// Immutable registry of message schemas keyed by api key.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    schemas: HashMap<i16, Arc<MessageSchema>>,
}

impl SchemaCatalog {
    /// Builds a catalog from already-constructed schemas, validating
    /// each and rejecting duplicate api keys.
    pub fn from_schemas(schemas: Vec<MessageSchema>) -> Result<Self> {
        let mut catalog = Self::default();
        for mut schema in schemas {
            schema.validate()?;
            let api_key = schema.api_key;
            if catalog.schemas.insert(api_key, Arc::new(schema)).is_some() {
                return Err(CodecError::InvalidSchema(format!(
                    "duplicate api key {}",
                    api_key
                )));
            }
        }
        Ok(catalog)
    }

    /// Loads the generated catalog from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let schemas: Vec<MessageSchema> = serde_json::from_str(json)
            .map_err(|e| CodecError::InvalidSchema(format!("catalog parse error: {}", e)))?;
        Self::from_schemas(schemas)
    }

    pub fn get(&self, api_key: i16) -> Option<&Arc<MessageSchema>> {
        self.schemas.get(&api_key)
    }

    pub fn is_supported(&self, api_key: i16, version: i16) -> bool {
        self.schemas
            .get(&api_key)
            .map_or(false, |s| s.supports_version(version))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All supported version ranges, sorted by api key: the payload a
    /// version-negotiation response advertises.
    pub fn api_versions(&self) -> Vec<ApiVersionRange> {
        let mut versions: Vec<ApiVersionRange> = self
            .schemas
            .values()
            .map(|s| ApiVersionRange {
                api_key: s.api_key,
                min_version: s.min_version,
                max_version: s.max_version,
            })
            .collect();
        versions.sort_by_key(|v| v.api_key);
        versions
    }
}
