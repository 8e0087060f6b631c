//! Text analysis for query input.
//!
//! The builder never tokenizes text itself: phrase matches, token matches and
//! parsed input all go through an [`Analyzer`]. The standard analyzer is a
//! Tantivy pipeline:
//! 1. `SimpleTokenizer` - splits on whitespace and punctuation
//! 2. `LowerCaser` - converts tokens to lowercase
//! 3. `RemoveLongFilter` - removes tokens longer than 255 bytes
//! 4. `StopWordFilter` - removes the classic English stop words
//! 5. `Stemmer` - optional language-specific stemming
//!
//! The stemmer language and stop word handling are configurable via the
//! `[analyzer]` section of the configuration.

use std::fmt;

use sift_config::AnalyzerSettings;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
    TextAnalyzer, TokenStream,
};

use crate::SiftError;

/// The classic English stop word list.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Converts text into an ordered sequence of normalized tokens.
///
/// Zero tokens is a legal result: a blank string, or text made only of stop
/// words, analyzes to nothing.
pub trait Analyzer: Send + Sync {
    /// Splits `text` into tokens, preserving their order.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Returns the tokens of `text` joined by single spaces.
    fn normalize(&self, text: &str) -> String {
        self.tokenize(text).join(" ")
    }
}

impl<F> Analyzer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// An [`Analyzer`] backed by a Tantivy [`TextAnalyzer`].
#[derive(Clone)]
pub struct TantivyAnalyzer {
    /// The wrapped pipeline, cloned per call since token streams borrow it mutably.
    inner: TextAnalyzer,
}

impl TantivyAnalyzer {
    /// Wraps an existing Tantivy pipeline.
    pub fn new(inner: TextAnalyzer) -> Self {
        Self { inner }
    }

    /// The standard pipeline: simple tokenizer, lowercasing, long token
    /// removal and classic English stop words, without stemming.
    pub fn standard() -> Self {
        Self::new(build_analyzer(&AnalyzerSettings::default(), None))
    }

    /// Builds a pipeline from analyzer settings.
    pub fn from_settings(settings: &AnalyzerSettings) -> Result<Self, SiftError> {
        let language = settings
            .stemmer
            .as_deref()
            .map(parse_language)
            .transpose()?;
        Ok(Self::new(build_analyzer(settings, language)))
    }
}

impl Analyzer for TantivyAnalyzer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        tokens
    }
}

impl fmt::Debug for TantivyAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TantivyAnalyzer").finish_non_exhaustive()
    }
}

/// Parses a stemmer language string into a Tantivy `Language`.
///
/// Supports lowercase language names matching Tantivy's `Language` enum.
/// Returns an error if the language is not recognized.
pub fn parse_language(name: &str) -> Result<Language, SiftError> {
    match name.to_lowercase().as_str() {
        "arabic" => Ok(Language::Arabic),
        "danish" => Ok(Language::Danish),
        "dutch" => Ok(Language::Dutch),
        "english" => Ok(Language::English),
        "finnish" => Ok(Language::Finnish),
        "french" => Ok(Language::French),
        "german" => Ok(Language::German),
        "greek" => Ok(Language::Greek),
        "hungarian" => Ok(Language::Hungarian),
        "italian" => Ok(Language::Italian),
        "norwegian" => Ok(Language::Norwegian),
        "portuguese" => Ok(Language::Portuguese),
        "romanian" => Ok(Language::Romanian),
        "russian" => Ok(Language::Russian),
        "spanish" => Ok(Language::Spanish),
        "swedish" => Ok(Language::Swedish),
        "tamil" => Ok(Language::Tamil),
        "turkish" => Ok(Language::Turkish),
        other => Err(SiftError::InvalidLanguage(other.to_string())),
    }
}

/// Builds the Tantivy pipeline for the given settings and stemmer language.
pub fn build_analyzer(settings: &AnalyzerSettings, language: Option<Language>) -> TextAnalyzer {
    let mut builder = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(settings.max_token_length))
        .dynamic();
    if settings.stop_words {
        let words = ENGLISH_STOP_WORDS.iter().map(|w| (*w).to_string());
        builder = builder.filter_dynamic(StopWordFilter::remove(words));
    }
    if let Some(language) = language {
        builder = builder.filter_dynamic(Stemmer::new(language));
    }
    builder.build()
}
