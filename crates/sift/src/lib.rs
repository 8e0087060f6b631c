//! Fluent boolean query construction for Tantivy indexes.
//!
//! This crate builds boolean full-text queries out of term matches, ranges,
//! phrase and prefix matches, and parsed free-text input. It handles:
//! - A mutable builder that appends clauses under a current occurrence mode
//! - Nested sub-queries built by closures
//! - Parsing of free-text input, with a literal-text fallback for input that
//!   is not valid query syntax
//! - Text analysis through a pluggable [`Analyzer`]
//! - Compilation of the finished tree into Tantivy queries
//!
//! # Example
//!
//! ```
//! use sift::QueryBuilder;
//!
//! let mut builder = QueryBuilder::new();
//! builder
//!     .match_term("lang", "rust")
//!     .match_parsed_input("body", "AND what", None)?
//!     .exclude()
//!     .match_any_term("tag", ["draft", "wip"]);
//!
//! assert_eq!(
//!     builder.to_string(),
//!     "+lang:rust +(body:what) -(tag:draft tag:wip)"
//! );
//! # Ok::<(), sift::SiftError>(())
//! ```

#![warn(missing_docs)]

mod analyzer;
mod builder;
mod compile;
mod date;
mod defaults;
mod error;
mod fields;
mod parser;
mod tree;

pub use analyzer::{
    Analyzer, ENGLISH_STOP_WORDS, TantivyAnalyzer, build_analyzer, parse_language,
};
pub use builder::QueryBuilder;
pub use compile::{CompileError, QueryCompiler};
pub use date::{to_oa_date, to_oa_days};
pub use defaults::{Defaults, defaults, install_defaults};
pub use error::SiftError;
pub use fields::FieldSet;
pub use parser::QueryParser;
pub use sift_config::{AnalyzerSettings, CompatVersion, Config, Operator, ParserSettings};
pub use sift_syntax::{QueryError, escape};
pub use tree::{BooleanQuery, Clause, Occur, QueryNode, RangeQuery, RangeValue, RawQuery, Rewrite};
