//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules.

use std::path::PathBuf;

use crate::{
    AnalyzerSettings, Config, ParserSettings,
    parse::{RawAnalyzerSettings, RawConfig, RawParserSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first,
/// lowest precedence last. For each setting the first defined value wins.
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    let mut config = Config::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref analyzer) = parsed.config.analyzer {
            apply_raw_analyzer(&mut config.analyzer, analyzer);
        }
        if let Some(ref parser) = parsed.config.parser {
            apply_raw_parser(&mut config.parser, parser);
        }
    }

    config
}

/// Applies raw analyzer settings to result, overwriting any present values.
fn apply_raw_analyzer(result: &mut AnalyzerSettings, raw: &RawAnalyzerSettings) {
    if let Some(ref v) = raw.stemmer {
        result.stemmer = Some(v.clone());
    }
    if let Some(v) = raw.stop_words {
        result.stop_words = v;
    }
    if let Some(v) = raw.max_token_length {
        result.max_token_length = v;
    }
}

/// Applies raw parser settings to result, overwriting any present values.
fn apply_raw_parser(result: &mut ParserSettings, raw: &RawParserSettings) {
    if let Some(v) = raw.version {
        result.version = v;
    }
    if let Some(v) = raw.default_operator {
        result.default_operator = v;
    }
    if let Some(v) = raw.phrase_slop {
        result.phrase_slop = v;
    }
    if let Some(v) = raw.fuzzy_min_similarity {
        result.fuzzy_min_similarity = v;
    }
}
