//! Configuration validation.

use crate::{Config, ConfigError};

/// Checks that every setting is within its allowed range.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.analyzer.max_token_length == 0 {
        return Err(ConfigError::InvalidSetting {
            setting: "analyzer.max_token_length",
            message: "must be greater than zero".into(),
        });
    }

    if let Some(stemmer) = &config.analyzer.stemmer
        && stemmer.trim().is_empty()
    {
        return Err(ConfigError::InvalidSetting {
            setting: "analyzer.stemmer",
            message: "must name a language or be omitted".into(),
        });
    }

    let similarity = config.parser.fuzzy_min_similarity;
    if !(0.0..1.0).contains(&similarity) {
        return Err(ConfigError::InvalidSetting {
            setting: "parser.fuzzy_min_similarity",
            message: format!("{similarity} is outside [0, 1)"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_token_length() {
        let mut config = Config::default();
        config.analyzer.max_token_length = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("analyzer.max_token_length"));
    }

    #[test]
    fn test_validate_blank_stemmer() {
        let mut config = Config::default();
        config.analyzer.stemmer = Some("  ".into());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_similarity_bounds() {
        let mut config = Config::default();
        config.parser.fuzzy_min_similarity = 1.0;
        assert!(validate_config(&config).is_err());

        config.parser.fuzzy_min_similarity = 0.0;
        assert!(validate_config(&config).is_ok());
    }
}
