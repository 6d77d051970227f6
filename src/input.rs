//! Input normalization - YAML or JSON bytes to canonical JSON text

use serde_json::Value;

use crate::error::ApplyError;

/// Input format detected from the first significant byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn detect(text: &str) -> Self {
        match text.trim_start().as_bytes().first() {
            Some(b'{' | b'[') => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parse raw input into a JSON value
pub fn parse(bytes: &[u8]) -> Result<Value, ApplyError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ApplyError::input(format!("input is not valid UTF-8: {}", e)))?;
    if text.trim().is_empty() {
        return Err(ApplyError::input("input is empty"));
    }

    match Format::detect(text) {
        Format::Json => serde_json::from_str(text)
            .map_err(|e| ApplyError::input(format!("invalid JSON: {}", e))),
        Format::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(text)
                .map_err(|e| ApplyError::input(format!("invalid YAML: {}", e)))?;
            serde_json::to_value(yaml).map_err(|e| {
                ApplyError::input(format!("YAML cannot be represented as JSON: {}", e))
            })
        }
    }
}

/// Normalize raw input to canonical JSON text
pub fn normalize(bytes: &[u8]) -> Result<String, ApplyError> {
    let value = parse(bytes)?;
    serde_json::to_string(&value)
        .map_err(|e| ApplyError::input(format!("could not serialize document: {}", e)))
}
