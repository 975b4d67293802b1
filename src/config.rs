//! Runtime configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration, read from an optional JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is unset (e.g. `"debug"`).
    pub log_level: Option<String>,

    /// Delimited-text reader settings.
    pub csv: CsvConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Settings for delimited-text sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// Field delimiter for `.csv` and extension-less files.
    pub delimiter: char,

    /// Cell contents treated as missing.
    pub null_values: Vec<String>,

    /// Whether to trim whitespace before matching null markers and parsing numbers.
    pub trim_whitespace: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            null_values: [
                "", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "-NaN", "-nan", "<NA>",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            trim_whitespace: true,
        }
    }
}

impl CsvConfig {
    /// Check if a raw cell should be treated as missing.
    pub fn is_null(&self, raw: &str) -> bool {
        let value = if self.trim_whitespace { raw.trim() } else { raw };
        self.null_values.iter().any(|p| p == value)
    }

    /// The delimiter as a single byte, if it is ASCII.
    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"csv": {"delimiter": ";"}}"#).unwrap();
        assert_eq!(cfg.csv.delimiter, ';');
        assert!(cfg.csv.trim_whitespace);
        assert!(cfg.csv.is_null(" NA "));
        assert!(cfg.log_level.is_none());
    }

    #[test]
    fn null_markers_respect_trimming() {
        let cfg = CsvConfig {
            trim_whitespace: false,
            ..CsvConfig::default()
        };
        assert!(cfg.is_null(""));
        assert!(!cfg.is_null(" NA"));
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let cfg = CsvConfig {
            delimiter: 'é',
            ..CsvConfig::default()
        };
        assert_eq!(cfg.delimiter_byte(), None);
        assert_eq!(CsvConfig::default().delimiter_byte(), Some(b','));
    }
}
