//! Configuration for sift.
//!
//! sift reads TOML files with two sections: `[analyzer]` controls the text
//! analysis pipeline and `[parser]` controls how free-text input is parsed.
//! Several files can be layered; the first file that defines a value wins.
//!
//! ```toml
//! [analyzer]
//! stemmer = "english"
//! stop_words = true
//! max_token_length = 255
//!
//! [parser]
//! version = "v1"
//! default_operator = "or"
//! phrase_slop = 0
//! fuzzy_min_similarity = 0.5
//! ```

#![warn(missing_docs)]

mod error;
mod merge;
mod parse;
mod validate;

use std::path::{Path, PathBuf};

pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawAnalyzerSettings, RawConfig, RawParserSettings, parse_config_file, parse_config_str,
};
use serde::{Deserialize, Serialize};
use validate::validate_config;

/// Top-level merged configuration for sift.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Text analysis settings.
    pub analyzer: AnalyzerSettings,
    /// Query parser settings.
    pub parser: ParserSettings,
}

impl Config {
    /// Loads and merges configuration from a list of files.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    /// Returns `Ok(Config::default())` if the list is empty. The merged result
    /// is validated before it is returned.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        if files.is_empty() {
            return Ok(Self::default());
        }

        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let config = merge_configs(&parsed);
        validate_config(&config)?;
        Ok(config)
    }

    /// Loads configuration from a single file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_from_files(&[path.to_path_buf()])
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw = parse_config_str(contents, Path::new("<string>"))?;
        let config = merge_configs(&[ParsedConfig {
            path: PathBuf::from("<string>"),
            config: raw,
        }]);
        validate_config(&config)?;
        Ok(config)
    }

    /// Serializes the effective settings to TOML format.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Text analysis settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Stemming language; no stemming when unset.
    pub stemmer: Option<String>,
    /// Whether to drop the classic English stop words.
    pub stop_words: bool,
    /// Tokens longer than this many bytes are dropped.
    pub max_token_length: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            stemmer: None,
            stop_words: true,
            max_token_length: 255,
        }
    }
}

/// Query parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Compatibility version of the parsed-input behavior.
    pub version: CompatVersion,
    /// Operator joining clauses that have no explicit conjunction.
    pub default_operator: Operator,
    /// Slop for phrases without an explicit `~N`.
    pub phrase_slop: u32,
    /// Similarity for fuzzy terms without an explicit `~N`.
    pub fuzzy_min_similarity: f32,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            version: CompatVersion::default(),
            default_operator: Operator::default(),
            phrase_slop: 0,
            fuzzy_min_similarity: 0.5,
        }
    }
}

/// Compatibility version tag for parsed input.
///
/// Versions differ in how an unquoted term that analyzes to several tokens is
/// treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatVersion {
    /// Several tokens become a phrase query.
    #[default]
    V1,
    /// Several tokens become a boolean group joined by the default operator.
    V2,
}

/// Default operator for clauses without an explicit conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Clauses are optional unless marked required.
    #[default]
    Or,
    /// Clauses are required unless joined by OR or prohibited.
    And,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.analyzer.stemmer, None);
        assert!(config.analyzer.stop_words);
        assert_eq!(config.parser.version, CompatVersion::V1);
        assert_eq!(config.parser.default_operator, Operator::Or);
        assert_eq!(config.parser.phrase_slop, 0);
    }

    #[test]
    fn from_toml_str_partial() {
        let config = Config::from_toml_str(
            r#"
[parser]
default_operator = "and"
"#,
        )
        .unwrap();
        assert_eq!(config.parser.default_operator, Operator::And);
        assert_eq!(config.parser.version, CompatVersion::V1);
        assert!(config.analyzer.stop_words);
    }

    #[test]
    fn to_toml_round_trip() {
        let mut config = Config::default();
        config.analyzer.stemmer = Some("english".into());
        config.parser.version = CompatVersion::V2;

        let toml = config.to_toml().unwrap();
        assert!(toml.contains("stemmer = \"english\""));
        assert!(toml.contains("version = \"v2\""));

        let parsed = Config::from_toml_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn from_toml_str_rejects_invalid_values() {
        let err = Config::from_toml_str("[parser]\nfuzzy_min_similarity = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("fuzzy_min_similarity"));
    }
}
