//! Typed access to off-chain metadata documents.
//!
//! A metadata document is a JSON object with the conventional fields
//! `name`, `description`, `image` and an optional `properties.expiresAt`.
//! Field lookups return `Option`, and kind conversions return
//! [`ConversionError`] instead of panicking on an unexpected shape.

use serde_json::{Map, Value};

use crate::error::{ConversionError, JsonKind, MetadataError};

/// Kind of a JSON value.
pub fn kind_of(value: &Value) -> JsonKind {
    match value {
        Value::Null => JsonKind::Null,
        Value::Bool(_) => JsonKind::Bool,
        Value::Number(_) => JsonKind::Number,
        Value::String(_) => JsonKind::String,
        Value::Array(_) => JsonKind::Array,
        Value::Object(_) => JsonKind::Object,
    }
}

/// Look up a field on a JSON object.
pub fn lookup_field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name)
}

/// Read a JSON value as a string.
pub fn as_string(value: &Value) -> Result<&str, ConversionError> {
    value.as_str().ok_or(ConversionError {
        expected: JsonKind::String,
        found: kind_of(value),
    })
}

/// Read a JSON value as an object.
pub fn as_object(value: &Value) -> Result<&Map<String, Value>, ConversionError> {
    value.as_object().ok_or(ConversionError {
        expected: JsonKind::Object,
        found: kind_of(value),
    })
}

/// Name, description and image of a Raft or BadgeSpec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptiveFields {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Image URI.
    pub image: String,
}

/// A parsed metadata document whose top-level value is a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    root: Map<String, Value>,
}

impl MetadataDocument {
    /// Parse metadata bytes.
    ///
    /// Fails with [`MetadataError::Parse`] on invalid JSON and
    /// [`MetadataError::Shape`] when the top-level value is not an object.
    pub fn parse(bytes: &[u8]) -> Result<Self, MetadataError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let root = as_object(&value)?.clone();
        Ok(Self { root })
    }

    /// Read a string field. A missing field reads as the empty string.
    pub fn text_field(&self, name: &str) -> Result<String, ConversionError> {
        match lookup_field(&self.root, name) {
            Some(value) => as_string(value).map(str::to_string),
            None => Ok(String::new()),
        }
    }

    /// Read `properties.expiresAt`.
    ///
    /// Returns `Ok(None)` when `properties` is absent or `expiresAt` is absent
    /// or not a string. Fails only when `properties` exists but is not an object.
    pub fn expires_at(&self) -> Result<Option<String>, ConversionError> {
        let Some(properties) = lookup_field(&self.root, "properties") else {
            return Ok(None);
        };
        let properties = as_object(properties)?;

        Ok(lookup_field(properties, "expiresAt")
            .and_then(|value| as_string(value).ok())
            .map(str::to_string))
    }
}
