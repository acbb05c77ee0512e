//! Raw key/value metadata as supplied by a dataset.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use georef_common::{GeorefError, GeorefResult};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::header;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Scalar(String),
    List(Vec<String>),
}

impl MetadataValue {
    /// View the value as a list of tokens.
    ///
    /// Scalars written as `{a, b, c}` are split on commas; other scalars are
    /// a one-element list.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            MetadataValue::List(items) => items.clone(),
            MetadataValue::Scalar(s) => {
                let trimmed = s.trim();
                match trimmed.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
                    Some(inner) => split_list(inner),
                    None => vec![trimmed.to_string()],
                }
            }
        }
    }
}

/// Split a comma-delimited list, trimming tokens and dropping trailing empties.
pub fn split_list(s: &str) -> Vec<String> {
    let mut tokens: Vec<String> = s.split(',').map(|t| t.trim().to_string()).collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Metadata mapping with case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawMetadata {
    entries: BTreeMap<String, MetadataValue>,
}

impl RawMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: MetadataValue) {
        self.entries.insert(normalize_key(key), value);
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens of a list-valued entry; `MalformedMetadata` when absent.
    pub fn list(&self, key: &str) -> GeorefResult<Vec<String>> {
        self.get(key)
            .map(MetadataValue::tokens)
            .ok_or_else(|| GeorefError::malformed(key, "missing from metadata"))
    }

    /// Raster size as (samples, lines), when the header declares it.
    pub fn dimensions(&self) -> Option<(u64, u64)> {
        let scalar = |key: &str| match self.get(key)? {
            MetadataValue::Scalar(s) => s.trim().parse::<u64>().ok(),
            MetadataValue::List(_) => None,
        };
        Some((scalar("samples")?, scalar("lines")?))
    }

    /// Parse an ENVI header.
    pub fn from_envi_header(text: &str) -> GeorefResult<Self> {
        header::parse_header(text)
    }

    /// Parse a flat JSON object.
    ///
    /// Arrays become lists; strings, numbers and booleans become scalars.
    pub fn from_json(text: &str) -> GeorefResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| GeorefError::malformed("metadata", format!("invalid JSON: {}", e)))?;

        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(GeorefError::malformed(
                    "metadata",
                    format!("expected a JSON object, got {}", json_kind(&other)),
                ))
            }
        };

        let mut metadata = Self::new();
        for (key, value) in object {
            let value = match value {
                Value::Array(items) => MetadataValue::List(items.iter().map(json_scalar).collect()),
                Value::Object(_) | Value::Null => continue,
                scalar => MetadataValue::Scalar(json_scalar(&scalar)),
            };
            metadata.insert(&key, value);
        }
        Ok(metadata)
    }

    /// Load from disk: `.json` files as JSON, anything else as an ENVI header.
    pub fn from_path(path: impl AsRef<Path>) -> GeorefResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| GeorefError::Io(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let metadata = if is_json {
            Self::from_json(&text)?
        } else {
            Self::from_envi_header(&text)?
        };

        info!(path = %path.display(), entries = metadata.len(), "Loaded metadata");
        Ok(metadata)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn json_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
