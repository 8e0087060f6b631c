//! Error types for sift configuration.

use std::{io, path::PathBuf};

use thiserror::Error;
use toml::{de, ser};

/// Errors that can occur when loading or processing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// Failed to serialize settings back to TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] ser::Error),

    /// A setting has a value outside its allowed range.
    #[error("invalid value for {setting}: {message}")]
    InvalidSetting {
        /// Dotted name of the setting, e.g. `parser.phrase_slop`.
        setting: &'static str,
        /// What is wrong with the value.
        message: String,
    },
}
