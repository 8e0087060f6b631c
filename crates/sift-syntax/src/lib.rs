//! Query-language lexer, parser and AST for sift.
//!
//! The language is the classic boolean search-box syntax:
//!
//! - **Terms**: `rust` - analyzed against the default field(s)
//! - **Phrases**: `"error handling"`, with optional slop `"error handling"~2`
//! - **Modifiers**: `+required`, `-excluded`, `NOT excluded`, `!excluded`
//! - **Conjunctions**: `rust AND async`, `rust OR golang` (also `&&`, `||`)
//! - **Grouping**: `(a b) OR (c d)` - precedence control
//! - **Fields**: `title:guide`, `title:(rust OR golang)`
//! - **Boosting**: `rust^2.5` - adjust term importance
//! - **Prefix, wildcard, fuzzy**: `prog*`, `te?t`, `roam~0.7`
//! - **Ranges**: `year:[2000 TO 2010]`, `name:{a TO m}`
//!
//! Reserved characters are escaped with a backslash; [`escape`] does this for
//! a whole string.
//!
//! # Example
//!
//! ```
//! use sift_syntax::parse;
//!
//! let query = parse("title:guide (rust OR golang) -deprecated").unwrap();
//! assert!(query.is_some());
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod escape;
mod lexer;
mod parser;

pub use ast::{Clause, Conjunction, Modifier, Query, QueryExpr};
pub use error::{QueryError, Stage};
pub use escape::{RESERVED, escape};
pub use lexer::{TermKind, Token, tokenize};
pub use parser::{MAX_DEPTH, parse};
