//! Syntax errors raised while reading query text.

use std::{error::Error, fmt};

/// The stage of reading at which a query was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The text could not be split into tokens.
    Lex,
    /// The tokens did not form a valid query.
    Parse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lex => "lex",
            Self::Parse => "parse",
        })
    }
}

/// A query syntax error, located by byte offset in the query text.
///
/// The rendered form quotes the query with a caret under the offending
/// position, followed by a hint for the common mistakes:
///
/// ```text
/// query syntax error: unclosed quote
///   "hello world
///   ^
/// hint: add a closing quote (") to complete the phrase
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// Stage that rejected the query.
    pub stage: Stage,
    /// What went wrong.
    pub message: String,
    /// Byte offset of the problem; the query length when input ended early.
    pub position: usize,
    /// The query text being read.
    pub query: String,
}

impl QueryError {
    /// An error raised while tokenizing.
    pub fn lex(message: impl Into<String>, position: usize, query: &str) -> Self {
        Self::new(Stage::Lex, message.into(), position, query)
    }

    /// An error raised while assembling tokens into a query.
    pub fn parse(message: impl Into<String>, position: usize, query: &str) -> Self {
        Self::new(Stage::Parse, message.into(), position, query)
    }

    /// Builds an error, clamping the position to the query length.
    fn new(stage: Stage, message: String, position: usize, query: &str) -> Self {
        Self {
            stage,
            message,
            position: position.min(query.len()),
            query: query.to_string(),
        }
    }

    /// A short suggestion for mistakes users commonly make in search boxes.
    pub fn hint(&self) -> Option<&'static str> {
        let message = self.message.as_str();
        match self.stage {
            Stage::Lex if message.contains("unclosed quote") => {
                Some("add a closing quote (\") to complete the phrase")
            }
            Stage::Lex if message.contains("unclosed range") => {
                Some("ranges look like [low TO high] or {low TO high}")
            }
            Stage::Lex if message.contains("after '^'") => {
                Some("escape '^' with a backslash to search for it literally")
            }
            Stage::Parse if message.contains("closing parenthesis") => {
                Some("add a closing parenthesis to match the opening one")
            }
            Stage::Parse if message.contains("AND") || message.contains("OR") => {
                Some("AND and OR need an expression on both sides, e.g. 'rust OR golang'")
            }
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "query syntax error: {}", self.message)?;
        writeln!(f, "  {}", self.query)?;
        let column = self
            .query
            .get(..self.position)
            .map_or(self.position, |prefix| prefix.chars().count());
        write!(f, "  {}^", " ".repeat(column))?;
        if let Some(hint) = self.hint() {
            write!(f, "\nhint: {hint}")?;
        }
        Ok(())
    }
}

impl Error for QueryError {}
