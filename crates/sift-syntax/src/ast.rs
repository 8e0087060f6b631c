//! Query abstract syntax tree.
//!
//! Represents parsed query expressions before they are analyzed and lowered
//! into search queries. The tree keeps the surface structure of the input
//! (conjunctions and modifiers per clause) because occurrence rules depend on
//! the parser's default operator, which is applied later.

/// How a clause is joined to the clause before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    /// Adjacent to the previous clause (or the first clause).
    #[default]
    None,
    /// Joined with `AND` / `&&`.
    And,
    /// Joined with `OR` / `||`.
    Or,
}

/// A prefix modifier on a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    /// No modifier.
    #[default]
    None,
    /// `+`: the clause is required.
    Required,
    /// `-`, `!` or `NOT`: the clause is prohibited.
    Prohibited,
}

/// One clause of a query or group.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Connection to the previous clause.
    pub conjunction: Conjunction,
    /// Required/prohibited modifier.
    pub modifier: Modifier,
    /// Explicit field (`field:`), if any.
    pub field: Option<String>,
    /// The matched expression.
    pub expr: QueryExpr,
    /// Explicit boost (`^N`), if any.
    pub boost: Option<f32>,
}

impl Clause {
    /// Creates a plain clause with no conjunction, modifier, field or boost.
    pub fn new(expr: QueryExpr) -> Self {
        Self {
            conjunction: Conjunction::None,
            modifier: Modifier::None,
            field: None,
            expr,
            boost: None,
        }
    }
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// A single search term, still to be analyzed.
    Term(String),

    /// A term ending in `*`, stored without the star.
    Prefix(String),

    /// A term containing `*` or `?` wildcards.
    Wildcard(String),

    /// A fuzzy term (`term~` or `term~0.7`).
    Fuzzy {
        /// The term text.
        term: String,
        /// Explicit minimum similarity, if given.
        similarity: Option<f32>,
    },

    /// A quoted phrase, still to be analyzed.
    Phrase {
        /// The phrase text between the quotes.
        text: String,
        /// Explicit slop (`"..."~N`), if given.
        slop: Option<u32>,
    },

    /// A bracketed range.
    Range {
        /// Lower endpoint text (`*` for open).
        lower: String,
        /// Upper endpoint text (`*` for open).
        upper: String,
        /// `[` rather than `{`.
        lower_inclusive: bool,
        /// `]` rather than `}`.
        upper_inclusive: bool,
    },

    /// A parenthesized group of clauses.
    Group(Vec<Clause>),
}

/// A parsed query: the top-level clause list.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Top-level clauses in input order.
    pub clauses: Vec<Clause>,
}
