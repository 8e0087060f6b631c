//! Query compiler.
//!
//! Compiles a built query tree into Tantivy queries against a schema. Fields
//! are resolved by name; term and range values are converted to the field's
//! type.

use std::{error::Error, fmt, ops::Bound, str::FromStr};

use chrono::DateTime as ChronoDateTime;
use tantivy::{
    DateTime, Term,
    query::{
        AllQuery, BooleanQuery, BoostQuery, ConstScoreQuery, EmptyQuery, FuzzyTermQuery, Occur,
        PhraseQuery, Query, QueryClone, RangeQuery, RegexQuery, TermQuery,
    },
    schema::{Field, FieldType, IndexRecordOption, Schema},
};

use crate::tree::{self, QueryNode, RangeValue, Rewrite};

/// Largest edit distance Tantivy's fuzzy matching supports.
const MAX_EDIT_DISTANCE: u8 = 2;

/// Error during query compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Error message.
    pub message: String,
}

impl CompileError {
    /// Creates a compile error.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CompileError {}

/// Compiles query trees into Tantivy queries.
pub struct QueryCompiler {
    /// Schema used to resolve field names and types.
    schema: Schema,
}

impl QueryCompiler {
    /// Creates a compiler for the given schema.
    pub fn new(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
        }
    }

    /// Compiles a boolean query.
    ///
    /// A non-empty group whose clauses are all prohibited matches every
    /// document except the excluded ones. An empty group matches nothing.
    pub fn compile(&self, query: &tree::BooleanQuery) -> Result<Box<dyn Query>, CompileError> {
        let mut clauses = query
            .clauses()
            .iter()
            .map(|clause| Ok((occur(clause.occur), self.compile_node(&clause.query)?)))
            .collect::<Result<Vec<(Occur, Box<dyn Query>)>, CompileError>>()?;

        if !clauses.is_empty() && clauses.iter().all(|(o, _)| *o == Occur::MustNot) {
            clauses.push((Occur::Must, Box::new(AllQuery)));
        }

        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Compiles a single node.
    pub fn compile_node(&self, node: &QueryNode) -> Result<Box<dyn Query>, CompileError> {
        match node {
            QueryNode::Term { field, value } => {
                let (term, option) = self.term(field, value)?;
                Ok(Box::new(TermQuery::new(term, option)))
            }
            QueryNode::Boolean(query) => self.compile(query),
            QueryNode::Range(range) => self.compile_range(range),
            QueryNode::Phrase { field, terms, slop } => self.compile_phrase(field, terms, *slop),
            QueryNode::Prefix {
                field,
                prefix,
                rewrite,
            } => {
                let term = Term::from_field_text(self.text_field(field)?, prefix);
                let query: Box<dyn Query> = Box::new(FuzzyTermQuery::new_prefix(term, 0, true));
                let query: Box<dyn Query> = match rewrite {
                    Rewrite::ConstantScore => Box::new(ConstScoreQuery::new(query, 1.0)),
                    Rewrite::Scoring => query,
                };
                Ok(query)
            }
            QueryNode::Wildcard { field, pattern } => {
                let regex = wildcard_regex(pattern);
                let query = RegexQuery::from_pattern(&regex, self.text_field(field)?)
                    .map_err(|e| CompileError::new(format!("invalid pattern {pattern:?}: {e}")))?;
                Ok(Box::new(query))
            }
            QueryNode::Fuzzy {
                field,
                term,
                min_similarity,
            } => {
                let distance = edit_distance(term, *min_similarity);
                let term = Term::from_field_text(self.text_field(field)?, term);
                Ok(Box::new(FuzzyTermQuery::new(term, distance, true)))
            }
            QueryNode::Boost { query, factor } => {
                Ok(Box::new(BoostQuery::new(self.compile_node(query)?, *factor)))
            }
            QueryNode::Raw(raw) => Ok(raw.query().box_clone()),
        }
    }

    /// Compiles a phrase; a single token becomes a term query.
    fn compile_phrase(
        &self,
        field: &str,
        tokens: &[String],
        slop: u32,
    ) -> Result<Box<dyn Query>, CompileError> {
        let field = self.text_field(field)?;
        let mut terms: Vec<Term> = tokens
            .iter()
            .map(|t| Term::from_field_text(field, t))
            .collect();

        match terms.len() {
            0 => Ok(Box::new(EmptyQuery)),
            1 => {
                let term = terms.remove(0);
                Ok(Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)))
            }
            _ => {
                let mut query = PhraseQuery::new(terms);
                query.set_slop(slop);
                Ok(Box::new(query))
            }
        }
    }

    /// Compiles a range, converting both endpoints to the field's type.
    fn compile_range(&self, range: &tree::RangeQuery) -> Result<Box<dyn Query>, CompileError> {
        let field = self.field(&range.field)?;
        let name = range.field.as_str();
        let lower = (range.lower.as_ref(), range.lower_inclusive);
        let upper = (range.upper.as_ref(), range.upper_inclusive);

        let query = match self.schema.get_field_entry(field).field_type() {
            FieldType::I64(_) => RangeQuery::new_i64_bounds(
                name.to_string(),
                bound(lower, |v| to_i64(name, v))?,
                bound(upper, |v| to_i64(name, v))?,
            ),
            FieldType::U64(_) => RangeQuery::new_u64_bounds(
                name.to_string(),
                bound(lower, |v| to_u64(name, v))?,
                bound(upper, |v| to_u64(name, v))?,
            ),
            FieldType::F64(_) => RangeQuery::new_f64_bounds(
                name.to_string(),
                bound(lower, |v| to_f64(name, v))?,
                bound(upper, |v| to_f64(name, v))?,
            ),
            FieldType::Date(_) => RangeQuery::new_date_bounds(
                name.to_string(),
                bound(lower, |v| to_date(name, v))?,
                bound(upper, |v| to_date(name, v))?,
            ),
            FieldType::Str(_) => {
                let lower = bound(lower, |v| Ok(v.to_string()))?;
                let upper = bound(upper, |v| Ok(v.to_string()))?;
                RangeQuery::new_str_bounds(
                    name.to_string(),
                    lower.as_ref().map(String::as_str),
                    upper.as_ref().map(String::as_str),
                )
            }
            other => return Err(unsupported(name, other)),
        };
        Ok(Box::new(query))
    }

    /// Builds a term for a field, parsing the value to the field's type.
    fn term(&self, name: &str, value: &str) -> Result<(Term, IndexRecordOption), CompileError> {
        let field = self.field(name)?;
        let term = match self.schema.get_field_entry(field).field_type() {
            FieldType::Str(_) => {
                return Ok((
                    Term::from_field_text(field, value),
                    IndexRecordOption::WithFreqs,
                ));
            }
            FieldType::I64(_) => Term::from_field_i64(field, parse_value(name, value)?),
            FieldType::U64(_) => Term::from_field_u64(field, parse_value(name, value)?),
            FieldType::F64(_) => Term::from_field_f64(field, parse_value(name, value)?),
            FieldType::Bool(_) => Term::from_field_bool(field, parse_value(name, value)?),
            FieldType::Date(_) => {
                Term::from_field_date(field, to_date(name, &RangeValue::from(value))?)
            }
            other => return Err(unsupported(name, other)),
        };
        Ok((term, IndexRecordOption::Basic))
    }

    /// Resolves a field by name.
    fn field(&self, name: &str) -> Result<Field, CompileError> {
        self.schema
            .get_field(name)
            .map_err(|_| CompileError::new(format!("unknown field: {name}")))
    }

    /// Resolves a field that must hold text.
    fn text_field(&self, name: &str) -> Result<Field, CompileError> {
        let field = self.field(name)?;
        match self.schema.get_field_entry(field).field_type() {
            FieldType::Str(_) => Ok(field),
            other => Err(CompileError::new(format!(
                "field {name} is {:?}, expected text",
                other.value_type()
            ))),
        }
    }
}

/// Maps a tree occurrence to Tantivy's.
fn occur(occur: tree::Occur) -> Occur {
    match occur {
        tree::Occur::Must => Occur::Must,
        tree::Occur::Should => Occur::Should,
        tree::Occur::MustNot => Occur::MustNot,
    }
}

/// Converts an optional endpoint into a bound.
fn bound<T>(
    (value, inclusive): (Option<&RangeValue>, bool),
    convert: impl Fn(&RangeValue) -> Result<T, CompileError>,
) -> Result<Bound<T>, CompileError> {
    Ok(match value {
        None => Bound::Unbounded,
        Some(v) if inclusive => Bound::Included(convert(v)?),
        Some(v) => Bound::Excluded(convert(v)?),
    })
}

/// Parses a value for a field.
fn parse_value<T: FromStr>(field: &str, value: &str) -> Result<T, CompileError> {
    value
        .parse()
        .map_err(|_| CompileError::new(format!("invalid value for field {field}: {value:?}")))
}

/// Error for a value that does not fit the field type.
fn invalid(field: &str, value: &RangeValue) -> CompileError {
    CompileError::new(format!("invalid value for field {field}: {value}"))
}

/// Error for a field type the compiler does not handle.
fn unsupported(field: &str, field_type: &FieldType) -> CompileError {
    CompileError::new(format!(
        "field {field} has unsupported type {:?}",
        field_type.value_type()
    ))
}

/// Converts an endpoint to a signed integer.
fn to_i64(field: &str, value: &RangeValue) -> Result<i64, CompileError> {
    match value {
        RangeValue::I64(v) => Ok(*v),
        RangeValue::F64(v) if v.fract() == 0.0 => Ok(*v as i64),
        RangeValue::F64(_) => Err(invalid(field, value)),
        RangeValue::Str(s) => parse_value(field, s),
    }
}

/// Converts an endpoint to an unsigned integer.
fn to_u64(field: &str, value: &RangeValue) -> Result<u64, CompileError> {
    match value {
        RangeValue::I64(v) => u64::try_from(*v).map_err(|_| invalid(field, value)),
        RangeValue::F64(v) if v.fract() == 0.0 && *v >= 0.0 => Ok(*v as u64),
        RangeValue::F64(_) => Err(invalid(field, value)),
        RangeValue::Str(s) => parse_value(field, s),
    }
}

/// Converts an endpoint to a float.
fn to_f64(field: &str, value: &RangeValue) -> Result<f64, CompileError> {
    match value {
        RangeValue::I64(v) => Ok(*v as f64),
        RangeValue::F64(v) => Ok(*v),
        RangeValue::Str(s) => parse_value(field, s),
    }
}

/// Converts an endpoint to a date: integers are Unix seconds, text is RFC 3339.
fn to_date(field: &str, value: &RangeValue) -> Result<DateTime, CompileError> {
    match value {
        RangeValue::I64(v) => Ok(DateTime::from_timestamp_secs(*v)),
        RangeValue::F64(_) => Err(invalid(field, value)),
        RangeValue::Str(s) => ChronoDateTime::parse_from_rfc3339(s)
            .map(|dt| DateTime::from_timestamp_secs(dt.timestamp()))
            .map_err(|_| invalid(field, value)),
    }
}

/// Translates a `*` / `?` pattern into a regular expression.
fn wildcard_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2);
    let mut buf = [0; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    regex
}

/// Edit distance allowed for a term at the given minimum similarity.
fn edit_distance(term: &str, min_similarity: f32) -> u8 {
    let len = term.chars().count() as f32;
    let edits = ((1.0 - min_similarity) * len).floor();
    if edits >= f32::from(MAX_EDIT_DISTANCE) {
        MAX_EDIT_DISTANCE
    } else if edits <= 0.0 {
        0
    } else {
        edits as u8
    }
}
