//! Record engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Record engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Maximum field name length in characters
    pub max_field_name_len: usize,
    /// Restrict field names to `[A-Za-z_][A-Za-z0-9_]*`
    pub strict_naming: bool,
    /// Conversion errors reported per field before cut-off (0 = unlimited)
    pub conversion_error_limit: u32,
    /// Decimal separator used by the copier for text/number conversions
    pub decimal_separator: char,
    /// Silence conversion errors on copies between fields of the same type
    pub suppress_size_only_conv_errors: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            max_field_name_len: 255,
            strict_naming: false,
            conversion_error_limit: 0,
            decimal_separator: '.',
            suppress_size_only_conv_errors: false,
        }
    }
}

impl RecordConfig {
    /// Parses a configuration from JSON text. Missing keys take defaults.
    pub fn from_json(text: &str) -> Result<Self, RecordError> {
        serde_json::from_str(text).map_err(|e| RecordError::Config(e.to_string()))
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let text = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
            context: "reading configuration",
            source,
        })?;
        Self::from_json(&text)
    }
}
