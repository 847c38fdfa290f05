//! Tool configuration.
//!
//! Handles loading and validating `optimg.toml`. One flat file, no
//! cascading: only the converter has knobs, and every field has a default.
//! The reveal contract ([`RevealConfig`](crate::reveal::RevealConfig)) is
//! supplied in code by the embedding host, not from this file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [convert]
//! quality = 80              # AVIF quality (1-100); WebP is lossless
//! formats = ["webp", "avif"]
//! ```
//!
//! Config files are sparse — override just the values you want. Unknown
//! keys are rejected to catch typos early.

use crate::imaging::VariantFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "optimg.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `optimg.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub convert: ConvertSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertSection {
    /// AVIF quality (1-100). WebP output is lossless.
    pub quality: u32,
    /// Variant formats to generate.
    pub formats: Vec<String>,
}

impl Default for ConvertSection {
    fn default() -> Self {
        Self {
            quality: 80,
            formats: vec!["webp".to_string(), "avif".to_string()],
        }
    }
}

impl ToolConfig {
    /// Load from a directory, falling back to defaults when no config file
    /// exists. A present-but-invalid file is an error, not a silent default.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.convert.quality == 0 || self.convert.quality > 100 {
            return Err(ConfigError::Validation(
                "convert.quality must be 1-100".into(),
            ));
        }
        for format in &self.convert.formats {
            if format != "webp" && format != "avif" {
                return Err(ConfigError::Validation(format!(
                    "convert.formats: unknown format '{format}' (expected webp or avif)"
                )));
            }
        }
        if self.convert.formats.is_empty() {
            return Err(ConfigError::Validation(
                "convert.formats must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Variant formats as typed values (validated order preserved).
    pub fn variant_formats(&self) -> Vec<VariantFormat> {
        self.convert
            .formats
            .iter()
            .filter_map(|f| match f.as_str() {
                "webp" => Some(VariantFormat::Webp),
                "avif" => Some(VariantFormat::Avif),
                _ => None,
            })
            .collect()
    }
}

/// A documented stock `optimg.toml` with every option at its default.
pub fn stock_config_toml() -> String {
    r#"# optimg configuration
# All options are optional - defaults shown below.

[convert]
# AVIF quality (1-100). WebP variants are lossless and ignore this.
quality = 80
# Variant formats to generate, each in a sibling folder named after it.
formats = ["webp", "avif"]
"#
    .to_string()
}
