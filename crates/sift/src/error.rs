//! Error types for the sift crate.

use sift_config::ConfigError;
use sift_syntax::QueryError;
use thiserror::Error;

/// Errors that can occur while building queries.
#[derive(Debug, Error)]
pub enum SiftError {
    /// Input could not be parsed, even after escaping it.
    #[error("{0}")]
    Query(#[from] QueryError),

    /// Invalid stemmer language.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Process-wide defaults were installed a second time.
    #[error("query builder defaults are already installed")]
    DefaultsAlreadyInstalled,
}
