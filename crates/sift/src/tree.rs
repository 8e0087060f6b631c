//! The boolean query tree.
//!
//! A [`BooleanQuery`] is an ordered list of [`Clause`]s, each pairing a
//! [`QueryNode`] with an [`Occur`]. Trees are append-only: the builder adds
//! clauses and never reorders or removes them. Every node renders to a
//! human-readable string through `Display`; the rendering is stable and is
//! what tests compare against.

use std::fmt;

use tantivy::query::{Query, QueryClone};

/// How a clause participates in its enclosing boolean query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occur {
    /// The clause must match (AND).
    #[default]
    Must,
    /// The clause may match and contributes to scoring (OR).
    Should,
    /// The clause must not match (AND NOT).
    MustNot,
}

impl Occur {
    /// The rendering prefix for clauses with this occurrence.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Must => "+",
            Self::Should => "",
            Self::MustNot => "-",
        }
    }
}

/// Scoring strategy for prefix matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rewrite {
    /// Every matching document gets the same score.
    #[default]
    ConstantScore,
    /// Matching documents are scored by the expanded terms.
    Scoring,
}

/// One endpoint of a range.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeValue {
    /// An integer endpoint.
    I64(i64),
    /// A floating point endpoint.
    F64(f64),
    /// A lexical endpoint.
    Str(String),
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I64(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v:?}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for RangeValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for RangeValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<&str> for RangeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RangeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// A range over one field. A missing endpoint leaves that side open.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    /// Field name.
    pub field: String,
    /// Lower endpoint, if bounded.
    pub lower: Option<RangeValue>,
    /// Upper endpoint, if bounded.
    pub upper: Option<RangeValue>,
    /// Whether the lower endpoint is included.
    pub lower_inclusive: bool,
    /// Whether the upper endpoint is included.
    pub upper_inclusive: bool,
}

impl fmt::Display for RangeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lower_inclusive { '[' } else { '{' };
        let close = if self.upper_inclusive { ']' } else { '}' };
        write!(f, "{}:{open}", self.field)?;
        match &self.lower {
            Some(v) => write!(f, "{v}")?,
            None => f.write_str("*")?,
        }
        f.write_str(" TO ")?;
        match &self.upper {
            Some(v) => write!(f, "{v}")?,
            None => f.write_str("*")?,
        }
        write!(f, "{close}")
    }
}

/// An externally built Tantivy query carried through the tree untouched.
pub struct RawQuery(pub Box<dyn Query>);

impl RawQuery {
    /// Returns the wrapped query.
    pub fn query(&self) -> &dyn Query {
        self.0.as_ref()
    }
}

impl Clone for RawQuery {
    fn clone(&self) -> Self {
        Self(self.0.box_clone())
    }
}

impl fmt::Debug for RawQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Raw queries compare by their debug form.
impl PartialEq for RawQuery {
    fn eq(&self, other: &Self) -> bool {
        format!("{self:?}") == format!("{other:?}")
    }
}

/// A node of the query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Exact match of an unanalyzed value.
    Term {
        /// Field name.
        field: String,
        /// The value to match.
        value: String,
    },

    /// A nested group of clauses.
    Boolean(BooleanQuery),

    /// Values between two endpoints.
    Range(RangeQuery),

    /// Tokens in order, allowing `slop` positions of movement.
    Phrase {
        /// Field name.
        field: String,
        /// Analyzed tokens.
        terms: Vec<String>,
        /// Allowed positional distance.
        slop: u32,
    },

    /// Values starting with a prefix.
    Prefix {
        /// Field name.
        field: String,
        /// The prefix, without a trailing `*`.
        prefix: String,
        /// Scoring strategy.
        rewrite: Rewrite,
    },

    /// Values matching a `*` / `?` pattern.
    Wildcard {
        /// Field name.
        field: String,
        /// The pattern.
        pattern: String,
    },

    /// Values within an edit distance of a term.
    Fuzzy {
        /// Field name.
        field: String,
        /// The term.
        term: String,
        /// Minimum similarity in `[0, 1]`.
        min_similarity: f32,
    },

    /// A query with a score multiplier.
    Boost {
        /// The boosted query.
        query: Box<QueryNode>,
        /// Score multiplier.
        factor: f32,
    },

    /// An opaque Tantivy query.
    Raw(RawQuery),
}

impl QueryNode {
    /// Creates a term node.
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a phrase node.
    pub fn phrase(field: impl Into<String>, terms: Vec<String>, slop: u32) -> Self {
        Self::Phrase {
            field: field.into(),
            terms,
            slop,
        }
    }

    /// Wraps the node in a boost.
    ///
    /// Boosting an already boosted node replaces its factor.
    pub fn boosted(self, factor: f32) -> Self {
        match self {
            Self::Boost { query, .. } => Self::Boost { query, factor },
            query => Self::Boost {
                query: Box::new(query),
                factor,
            },
        }
    }

    /// A short name for the node kind, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Term { .. } => "term",
            Self::Boolean(_) => "boolean",
            Self::Range(_) => "range",
            Self::Phrase { .. } => "phrase",
            Self::Prefix { .. } => "prefix",
            Self::Wildcard { .. } => "wildcard",
            Self::Fuzzy { .. } => "fuzzy",
            Self::Boost { .. } => "boost",
            Self::Raw(_) => "raw",
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term { field, value } => {
                if value.chars().any(char::is_whitespace) {
                    write!(f, "{field}:\"{value}\"")
                } else {
                    write!(f, "{field}:{value}")
                }
            }
            Self::Boolean(query) => write!(f, "{query}"),
            Self::Range(range) => write!(f, "{range}"),
            Self::Phrase { field, terms, slop } => {
                write!(f, "{field}:\"{}\"", terms.join(" "))?;
                if *slop > 0 {
                    write!(f, "~{slop}")?;
                }
                Ok(())
            }
            Self::Prefix { field, prefix, .. } => write!(f, "{field}:{prefix}*"),
            Self::Wildcard { field, pattern } => write!(f, "{field}:{pattern}"),
            Self::Fuzzy {
                field,
                term,
                min_similarity,
            } => write!(f, "{field}:{term}~{min_similarity:?}"),
            Self::Boost { query, factor } => {
                match query.as_ref() {
                    Self::Boolean(inner) => write!(f, "({inner})")?,
                    other => write!(f, "{other}")?,
                }
                // A unit boost is implied.
                if *factor != 1.0 {
                    write!(f, "^{factor:?}")?;
                }
                Ok(())
            }
            Self::Raw(raw) => write!(f, "{raw:?}"),
        }
    }
}

impl From<BooleanQuery> for QueryNode {
    fn from(query: BooleanQuery) -> Self {
        Self::Boolean(query)
    }
}

impl From<RangeQuery> for QueryNode {
    fn from(range: RangeQuery) -> Self {
        Self::Range(range)
    }
}

impl From<RawQuery> for QueryNode {
    fn from(raw: RawQuery) -> Self {
        Self::Raw(raw)
    }
}

impl From<Box<dyn Query>> for QueryNode {
    fn from(query: Box<dyn Query>) -> Self {
        Self::Raw(RawQuery(query))
    }
}

/// One entry of a boolean query.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// The matched query.
    pub query: QueryNode,
    /// How the query participates.
    pub occur: Occur,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.occur.prefix())?;
        match &self.query {
            QueryNode::Boolean(inner) => write!(f, "({inner})"),
            other => write!(f, "{other}"),
        }
    }
}

/// An ordered list of clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanQuery {
    /// Clauses in insertion order.
    clauses: Vec<Clause>,
}

impl BooleanQuery {
    /// Creates an empty boolean query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a clause.
    pub fn add(&mut self, query: QueryNode, occur: Occur) {
        self.clauses.push(Clause { query, occur });
    }

    /// The clauses in insertion order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether the query has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl FromIterator<Clause> for BooleanQuery {
    fn from_iter<I: IntoIterator<Item = Clause>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}
