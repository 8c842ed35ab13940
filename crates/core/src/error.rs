//! Error types for the core crate.

use thiserror::Error;

/// Kind of a JSON value, used in conversion errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Any number
    Number,
    /// A string
    String,
    /// An array
    Array,
    /// An object
    Object,
}

impl std::fmt::Display for JsonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "bool",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// A JSON value did not have the expected kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Expected {expected}, found {found}")]
pub struct ConversionError {
    /// Kind the caller asked for.
    pub expected: JsonKind,
    /// Kind that was actually present.
    pub found: JsonKind,
}

/// Metadata document could not be turned into usable fields.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Bytes were not valid JSON.
    #[error("Invalid metadata JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// JSON was valid but had the wrong shape.
    #[error("Unexpected metadata shape: {0}")]
    Shape(#[from] ConversionError),
}

/// Core error type.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Stored badge status string was not recognised.
    #[error("Unknown badge status: {0}")]
    UnknownBadgeStatus(String),
}
