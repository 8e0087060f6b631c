//! Process-wide builder defaults.
//!
//! Every new [`QueryBuilder`](crate::QueryBuilder) starts from the analyzer
//! and parser settings installed here. Defaults can be installed once, before
//! the first builder reads them; afterwards they are read-only.

use std::{fmt, sync::Arc, sync::OnceLock};

use log::debug;
use sift_config::{Config, ParserSettings};

use crate::{Analyzer, SiftError, TantivyAnalyzer};

/// The installed defaults.
static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

/// Analyzer and parser settings shared by new builders.
#[derive(Clone)]
pub struct Defaults {
    /// Analyzer for phrase, token and parsed-input matches.
    analyzer: Arc<dyn Analyzer>,
    /// Parser settings for parsed input.
    parser: ParserSettings,
}

impl Defaults {
    /// Creates defaults from an analyzer and parser settings.
    pub fn new(analyzer: Arc<dyn Analyzer>, parser: ParserSettings) -> Self {
        Self { analyzer, parser }
    }

    /// The standard analyzer with default parser settings.
    pub fn standard() -> Self {
        Self::new(
            Arc::new(TantivyAnalyzer::standard()),
            ParserSettings::default(),
        )
    }

    /// Builds defaults from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, SiftError> {
        let analyzer = TantivyAnalyzer::from_settings(&config.analyzer)?;
        Ok(Self::new(Arc::new(analyzer), config.parser))
    }

    /// The default analyzer.
    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// The default parser settings.
    pub fn parser(&self) -> ParserSettings {
        self.parser
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defaults")
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

/// Installs process-wide defaults.
///
/// Fails with [`SiftError::DefaultsAlreadyInstalled`] if defaults were
/// already installed, or already read by a builder.
pub fn install_defaults(defaults: Defaults) -> Result<(), SiftError> {
    let parser = defaults.parser;
    DEFAULTS
        .set(defaults)
        .map_err(|_| SiftError::DefaultsAlreadyInstalled)?;
    debug!("installed query builder defaults: {parser:?}");
    Ok(())
}

/// The process-wide defaults, installing the standard ones on first use.
pub fn defaults() -> &'static Defaults {
    DEFAULTS.get_or_init(Defaults::standard)
}
