//! Configuration file parsing.
//!
//! Parses individual TOML files into intermediate `RawConfig` structures
//! that preserve the optional nature of all fields before merging.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{CompatVersion, ConfigError, Operator};

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional to support partial configs that will be merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// Analyzer section.
    pub analyzer: Option<RawAnalyzerSettings>,
    /// Parser section.
    pub parser: Option<RawParserSettings>,
}

/// Raw analyzer settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawAnalyzerSettings {
    /// Stemming language.
    pub stemmer: Option<String>,
    /// Whether to drop stop words.
    pub stop_words: Option<bool>,
    /// Maximum token length in bytes.
    pub max_token_length: Option<usize>,
}

/// Raw parser settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawParserSettings {
    /// Compatibility version.
    pub version: Option<CompatVersion>,
    /// Default operator.
    pub default_operator: Option<Operator>,
    /// Default phrase slop.
    pub phrase_slop: Option<u32>,
    /// Default fuzzy similarity.
    pub fuzzy_min_similarity: Option<f32>,
}

/// Parses a configuration file from disk.
///
/// Returns a `RawConfig` with all fields as optionals, ready for merging.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}
