//! Fluent construction of boolean query trees.
//!
//! A [`QueryBuilder`] owns a [`BooleanQuery`] and a current occurrence mode.
//! Every match operation appends one clause under the mode in effect at the
//! time of the call; switching modes never touches clauses already appended.
//!
//! ```
//! use sift::QueryBuilder;
//!
//! let mut builder = QueryBuilder::new();
//! builder
//!     .match_term("foo", "bar")
//!     .optionally_match()
//!     .match_term("baz", "boo");
//! assert_eq!(builder.to_string(), "+foo:bar baz:boo");
//! ```

use std::{fmt, sync::Arc};

use chrono::NaiveDateTime;
use log::{debug, trace};
use sift_config::{Operator, ParserSettings};
use sift_syntax::escape;

use crate::{
    Analyzer, FieldSet, QueryParser, SiftError,
    date::{to_oa_date, to_oa_days},
    defaults::{Defaults, defaults},
    tree::{BooleanQuery, Occur, QueryNode, RangeQuery, RangeValue, Rewrite},
};

/// Builds a boolean query by appending clauses.
pub struct QueryBuilder {
    /// The tree under construction.
    query: BooleanQuery,
    /// Analyzer for phrase, token and parsed-input matches.
    analyzer: Arc<dyn Analyzer>,
    /// Settings for parsed-input matches.
    parser: ParserSettings,
    /// Occurrence applied to the next appended clause.
    occur: Occur,
}

impl QueryBuilder {
    /// Creates an empty builder from the process-wide defaults.
    pub fn new() -> Self {
        Self::with_defaults(defaults())
    }

    /// Creates an empty builder from explicit defaults.
    pub fn with_defaults(defaults: &Defaults) -> Self {
        Self {
            query: BooleanQuery::new(),
            analyzer: Arc::clone(defaults.analyzer()),
            parser: defaults.parser(),
            occur: Occur::Must,
        }
    }

    /// An empty builder sharing this one's analyzer and settings, in `Must` mode.
    fn sub_builder(&self) -> Self {
        Self {
            query: BooleanQuery::new(),
            analyzer: Arc::clone(&self.analyzer),
            parser: self.parser,
            occur: Occur::Must,
        }
    }

    /// Appends a clause under `occur`, or the current mode.
    fn add(&mut self, query: QueryNode, occur: Option<Occur>) -> &mut Self {
        let occur = occur.unwrap_or(self.occur);
        trace!("appending {} clause as {occur:?}", query.kind());
        self.query.add(query, occur);
        self
    }

    /// Appends later clauses as required (AND).
    pub fn require_matches(&mut self) -> &mut Self {
        self.occur = Occur::Must;
        self
    }

    /// Appends later clauses as prohibited (AND NOT).
    pub fn exclude(&mut self) -> &mut Self {
        self.occur = Occur::MustNot;
        self
    }

    /// Appends later clauses as optional (OR, scored).
    pub fn optionally_match(&mut self) -> &mut Self {
        self.occur = Occur::Should;
        self
    }

    /// The occurrence the next clause will be appended with.
    pub fn occur(&self) -> Occur {
        self.occur
    }

    /// Replaces the analyzer used by later operations.
    pub fn with_analyzer(&mut self, analyzer: Arc<dyn Analyzer>) -> &mut Self {
        self.analyzer = analyzer;
        self
    }

    /// The analyzer used by phrase, token and parsed-input matches.
    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Calls `f` with each item and this builder, in iteration order.
    pub fn for_each<I, F>(&mut self, items: I, mut f: F) -> &mut Self
    where
        I: IntoIterator,
        F: FnMut(I::Item, &mut Self) -> &mut Self,
    {
        for item in items {
            f(item, self);
        }
        self
    }

    /// Builds a nested query in a fresh sub-builder and appends it as one clause.
    ///
    /// The sub-builder starts empty, in `Must` mode, with this builder's
    /// analyzer.
    pub fn match_sub_query<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self) -> &mut Self,
    {
        let mut sub = self.sub_builder();
        f(&mut sub);
        self.add(sub.query.into(), None)
    }

    /// Like [`match_sub_query`](Self::match_sub_query), for closures that can fail.
    ///
    /// Nothing is appended when `f` returns an error.
    pub fn try_match_sub_query<F, E>(&mut self, f: F) -> Result<&mut Self, E>
    where
        F: FnOnce(&mut Self) -> Result<&mut Self, E>,
    {
        let mut sub = self.sub_builder();
        f(&mut sub)?;
        Ok(self.add(sub.query.into(), None))
    }

    /// Matches an exact, unanalyzed value.
    pub fn match_term(&mut self, field: &str, value: impl ToString) -> &mut Self {
        self.add(QueryNode::term(field, value.to_string()), None)
    }

    /// Matches an exact value when there is one; `None` is a no-op.
    pub fn match_optional_term(&mut self, field: &str, value: Option<impl ToString>) -> &mut Self {
        match value {
            Some(value) => self.match_term(field, value),
            None => self,
        }
    }

    /// Requires every value, as one nested clause.
    pub fn match_all_terms<I>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.match_term_group(field, values, Occur::Must)
    }

    /// Matches at least one value, as one nested clause.
    pub fn match_any_term<I>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.match_term_group(field, values, Occur::Should)
    }

    /// Prohibits every value, as one nested clause.
    pub fn match_none_of_terms<I>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.match_term_group(field, values, Occur::MustNot)
    }

    /// Groups one term per value under `inner`; no values is a no-op.
    fn match_term_group<I>(&mut self, field: &str, values: I, inner: Occur) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let mut group = BooleanQuery::new();
        for value in values {
            group.add(QueryNode::term(field, value.to_string()), inner);
        }
        if group.is_empty() {
            return self;
        }
        self.add(group.into(), None)
    }

    /// Matches at least one of the analyzed tokens of `text`.
    pub fn match_some_tokens(&mut self, field: &str, text: &str) -> &mut Self {
        let tokens = self.analyzer.tokenize(text);
        self.match_any_term(field, tokens)
    }

    /// Appends a prebuilt query, such as a boxed Tantivy query.
    pub fn match_query(&mut self, query: impl Into<QueryNode>) -> &mut Self {
        self.add(query.into(), None)
    }

    /// Appends a prebuilt query when there is one; `None` is a no-op.
    pub fn match_optional_query(&mut self, query: Option<impl Into<QueryNode>>) -> &mut Self {
        match query {
            Some(query) => self.match_query(query),
            None => self,
        }
    }

    /// Matches integers between two bounds; either side may be open.
    ///
    /// A no-op when both bounds are `None`.
    pub fn match_range(
        &mut self,
        field: &str,
        lower: impl Into<Option<i64>>,
        upper: impl Into<Option<i64>>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> &mut Self {
        let (lower, upper) = (lower.into(), upper.into());
        if lower.is_none() && upper.is_none() {
            return self;
        }
        self.add_range(RangeQuery {
            field: field.to_string(),
            lower: lower.map(RangeValue::I64),
            upper: upper.map(RangeValue::I64),
            lower_inclusive,
            upper_inclusive,
        })
    }

    /// Matches floating point values between two bounds.
    pub fn match_double_range(
        &mut self,
        field: &str,
        lower: f64,
        upper: f64,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> &mut Self {
        self.add_range(RangeQuery {
            field: field.to_string(),
            lower: Some(RangeValue::F64(lower)),
            upper: Some(RangeValue::F64(upper)),
            lower_inclusive,
            upper_inclusive,
        })
    }

    /// Matches values lexically between two bounds, both inclusive.
    ///
    /// A no-op when both bounds are `None`.
    pub fn match_term_range(
        &mut self,
        field: &str,
        lower: Option<&str>,
        upper: Option<&str>,
    ) -> &mut Self {
        if lower.is_none() && upper.is_none() {
            return self;
        }
        self.add_range(RangeQuery {
            field: field.to_string(),
            lower: lower.map(RangeValue::from),
            upper: upper.map(RangeValue::from),
            lower_inclusive: true,
            upper_inclusive: true,
        })
    }

    /// Matches dates stored as whole OLE Automation day numbers.
    ///
    /// Each bound is encoded and truncated toward zero. A no-op when both
    /// bounds are `None`.
    pub fn match_date_range(
        &mut self,
        field: &str,
        start: impl Into<Option<NaiveDateTime>>,
        end: impl Into<Option<NaiveDateTime>>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> &mut Self {
        let start = start.into().map(to_oa_days);
        let end = end.into().map(to_oa_days);
        self.match_range(field, start, end, lower_inclusive, upper_inclusive)
    }

    /// Matches dates stored as fractional OLE Automation dates.
    pub fn match_oa_date_range(
        &mut self,
        field: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> &mut Self {
        self.match_double_range(
            field,
            to_oa_date(start),
            to_oa_date(end),
            lower_inclusive,
            upper_inclusive,
        )
    }

    /// Appends a range clause.
    fn add_range(&mut self, range: RangeQuery) -> &mut Self {
        self.add(range.into(), None)
    }

    /// Matches the analyzed tokens of `phrase` in order, within `slop`
    /// positions. Blank text, or text without tokens, is a no-op.
    pub fn match_phrase(&mut self, field: &str, phrase: &str, slop: u32) -> &mut Self {
        if phrase.trim().is_empty() {
            return self;
        }
        let terms = self.analyzer.tokenize(phrase);
        if terms.is_empty() {
            return self;
        }
        self.add(QueryNode::phrase(field, terms, slop), None)
    }

    /// Matches values starting with `prefix`, with constant scoring.
    pub fn match_prefix(&mut self, field: &str, prefix: &str) -> &mut Self {
        self.match_prefix_with(field, prefix, Rewrite::default())
    }

    /// Matches values starting with `prefix`. Blank prefixes are a no-op.
    ///
    /// The prefix is not analyzed.
    pub fn match_prefix_with(&mut self, field: &str, prefix: &str, rewrite: Rewrite) -> &mut Self {
        if prefix.trim().is_empty() {
            return self;
        }
        self.add(
            QueryNode::Prefix {
                field: field.to_string(),
                prefix: prefix.to_string(),
                rewrite,
            },
            None,
        )
    }

    /// Parses free-text input against `fields` and appends the result.
    ///
    /// `operator` overrides the configured default operator. Input that fails
    /// to parse is lower-cased, escaped and parsed again as literal text; an
    /// error is returned only if that second parse also fails, in which case
    /// nothing is appended. Blank input, and input that analyzes to nothing,
    /// are no-ops.
    pub fn match_parsed_input(
        &mut self,
        fields: impl Into<FieldSet>,
        text: &str,
        operator: impl Into<Option<Operator>>,
    ) -> Result<&mut Self, SiftError> {
        if text.trim().is_empty() {
            return Ok(self);
        }

        let mut parser = QueryParser::new(fields, Arc::clone(&self.analyzer), self.parser);
        if let Some(operator) = operator.into() {
            parser.set_default_operator(operator);
        }

        let parsed = match parser.parse(text) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(
                    "query {text:?} did not parse ({}), retrying as literal text",
                    err.message
                );
                parser.parse(&escape(&text.to_lowercase()))?
            }
        };

        Ok(match parsed {
            Some(query) => self.add(query, None),
            None => self,
        })
    }

    /// Requires at least one of `values` to match as parsed input.
    ///
    /// Each value is parsed with the AND operator into an optional clause of
    /// one group, which is appended as required regardless of the current
    /// mode. No values, or values that all parse to nothing, are a no-op.
    pub fn match_any_parsed_input<I>(
        &mut self,
        field: &str,
        values: I,
    ) -> Result<&mut Self, SiftError>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let mut group = self.sub_builder();
        group.optionally_match();
        for value in values {
            group.match_parsed_input(field, &value.to_string(), Operator::And)?;
        }
        if group.query.is_empty() {
            return Ok(self);
        }
        Ok(self.add(group.query.into(), Some(Occur::Must)))
    }

    /// Calls `f` when `condition` holds.
    pub fn if_true<F>(&mut self, condition: bool, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self) -> &mut Self,
    {
        if condition {
            f(self);
        }
        self
    }

    /// Calls `then` when `condition` holds and `otherwise` when it does not.
    pub fn if_else<F, G>(&mut self, condition: bool, then: F, otherwise: G) -> &mut Self
    where
        F: FnOnce(&mut Self) -> &mut Self,
        G: FnOnce(&mut Self) -> &mut Self,
    {
        if condition {
            then(self);
        } else {
            otherwise(self);
        }
        self
    }

    /// Calls `f` when `condition` does not hold.
    pub fn if_false<F>(&mut self, condition: bool, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self) -> &mut Self,
    {
        self.if_true(!condition, f)
    }

    /// Calls `f` when no clause has been appended yet.
    pub fn if_empty<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self) -> &mut Self,
    {
        let empty = self.query.is_empty();
        self.if_true(empty, f)
    }

    /// Calls `f` when at least one clause has been appended.
    pub fn if_non_empty<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self) -> &mut Self,
    {
        let non_empty = !self.query.is_empty();
        self.if_true(non_empty, f)
    }

    /// Whether no clause has been appended.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// The tree built so far.
    pub fn query(&self) -> &BooleanQuery {
        &self.query
    }

    /// A copy of the tree built so far.
    pub fn build(&self) -> BooleanQuery {
        self.query.clone()
    }

    /// Consumes the builder, returning its tree.
    pub fn into_query(self) -> BooleanQuery {
        self.query
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query)
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("query", &self.query)
            .field("occur", &self.occur)
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sift_config::CompatVersion;
    use tantivy::query::{AllQuery, Query};

    use super::*;
    use crate::TantivyAnalyzer;

    fn builder() -> QueryBuilder {
        QueryBuilder::with_defaults(&Defaults::standard())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn starts_empty_in_must_mode() {
        let b = builder();
        assert!(b.is_empty());
        assert_eq!(b.occur(), Occur::Must);
        assert_eq!(b.to_string(), "");
    }

    #[test]
    fn mode_applies_at_append_time() {
        let mut b = builder();
        b.match_term("a", 1)
            .exclude()
            .match_term("b", 2)
            .optionally_match()
            .match_term("c", 3)
            .require_matches()
            .match_term("d", 4);
        assert_eq!(b.to_string(), "+a:1 -b:2 c:3 +d:4");
    }

    #[test]
    fn optional_term() {
        let mut b = builder();
        b.match_optional_term("foo", None::<&str>)
            .match_optional_term("foo", Some("bar"));
        assert_eq!(b.to_string(), "+foo:bar");
    }

    #[test]
    fn term_groups_follow_outer_mode() {
        let mut b = builder();
        b.optionally_match().match_all_terms("foo", ["a1", "b1"]);
        assert_eq!(b.to_string(), "(+foo:a1 +foo:b1)");
    }

    #[test]
    fn term_groups_accept_any_display_values() {
        let mut b = builder();
        b.match_any_term("year", vec![1999, 2000]);
        assert_eq!(b.to_string(), "+(year:1999 year:2000)");
    }

    #[test]
    fn sub_builder_starts_in_must_mode() {
        let mut b = builder();
        b.exclude().match_sub_query(|s| {
            assert_eq!(s.occur(), Occur::Must);
            s.match_term("a", "x").match_term("b", "y")
        });
        assert_eq!(b.to_string(), "-(+a:x +b:y)");
    }

    #[test]
    fn sub_queries_nest() {
        let mut b = builder();
        b.match_sub_query(|s| {
            s.optionally_match()
                .match_term("a", "x")
                .match_sub_query(|t| {
                    t.match_term("b", "y")
                        .match_sub_query(|u| u.match_term("c", "z"))
                })
        });
        assert_eq!(b.to_string(), "+(a:x (+b:y +(+c:z)))");
    }

    #[test]
    fn sub_builder_inherits_analyzer() {
        let mut b = builder();
        let upper: Arc<dyn Analyzer> = Arc::new(|text: &str| vec![text.to_uppercase()]);
        b.with_analyzer(upper)
            .match_sub_query(|s| s.match_phrase("f", "abc", 0));
        assert_eq!(b.to_string(), "+(+f:\"ABC\")");
    }

    #[test]
    fn try_sub_query_appends_on_success() {
        let mut b = builder();
        b.try_match_sub_query(|s| s.match_parsed_input("foo", "bar", None))
            .unwrap();
        assert_eq!(b.to_string(), "+(+foo:bar)");
    }

    #[test]
    fn try_sub_query_discards_on_error() {
        let mut b = builder();
        let result = b.try_match_sub_query(|s| {
            s.match_term("a", "x");
            Err::<&mut QueryBuilder, _>("nope")
        });
        assert_eq!(result.unwrap_err(), "nope");
        assert!(b.is_empty());
    }

    #[test]
    fn match_query_wraps_tantivy_queries() {
        let mut b = builder();
        b.match_query(Box::new(AllQuery) as Box<dyn Query>)
            .match_optional_query(None::<QueryNode>)
            .match_optional_query(Some(QueryNode::term("f", "x")));
        assert_eq!(b.to_string(), "+AllQuery +f:x");
    }

    #[test]
    fn integer_ranges() {
        let mut b = builder();
        b.match_range("n", None, None, true, true)
            .match_range("n", Some(1), Some(5), true, false)
            .match_range("n", None, Some(9), false, true);
        assert_eq!(b.to_string(), "+n:[1 TO 5} +n:{* TO 9]");
    }

    #[test]
    fn double_and_term_ranges() {
        let mut b = builder();
        b.match_double_range("d", 0.5, 2.0, true, true)
            .match_term_range("s", None, None)
            .match_term_range("s", Some("apple"), None);
        assert_eq!(b.to_string(), "+d:[0.5 TO 2.0] +s:[apple TO *]");
    }

    #[test]
    fn date_ranges() {
        let mut b = builder();
        b.match_date_range("day", None, None, true, true)
            .match_date_range("day", Some(date(2000, 1, 1)), None, true, true)
            .match_oa_date_range("at", date(1899, 12, 30), date(1970, 1, 1), true, false);
        assert_eq!(b.to_string(), "+day:[36526 TO *] +at:[0.0 TO 25569.0}");
    }

    #[test]
    fn phrases_are_analyzed() {
        let mut b = builder();
        b.match_phrase("f", "  ", 0)
            .match_phrase("f", "the", 0)
            .match_phrase("f", "Quick, Brown Fox", 1);
        assert_eq!(b.to_string(), "+f:\"quick brown fox\"~1");
    }

    #[test]
    fn prefixes_are_not_analyzed() {
        let mut b = builder();
        b.match_prefix("f", " ")
            .match_prefix("f", "Pre")
            .match_prefix_with("f", "sco", Rewrite::Scoring);
        assert_eq!(b.to_string(), "+f:Pre* +f:sco*");
        assert!(matches!(
            b.query().clauses()[1].query,
            QueryNode::Prefix {
                rewrite: Rewrite::Scoring,
                ..
            }
        ));
    }

    #[test]
    fn some_tokens() {
        let mut b = builder();
        b.match_some_tokens("f", "The quick fox").match_some_tokens("f", "the");
        assert_eq!(b.to_string(), "+(f:quick f:fox)");
    }

    #[test]
    fn parsed_input_blank_is_noop() {
        let mut b = builder();
        b.match_parsed_input("foo", "  ", None).unwrap();
        b.match_parsed_input("foo", "the", None).unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn deeply_nested_input_falls_back() {
        let mut b = builder();
        b.match_parsed_input("foo", &"(".repeat(10_000), None)
            .unwrap();
        assert!(b.is_empty());

        let balanced = format!("{}fox{}", "(".repeat(10_000), ")".repeat(10_000));
        b.match_parsed_input("foo", &balanced, None).unwrap();
        assert_eq!(b.to_string(), "+foo:fox");
    }

    #[test]
    fn leading_wildcard_falls_back() {
        let mut b = builder();
        b.match_parsed_input("foo", "*Fox", None).unwrap();
        assert_eq!(b.to_string(), "+foo:fox");
    }

    #[test]
    fn parsed_input_operator_override() {
        let mut b = builder();
        b.match_parsed_input("foo", "bar baz", Operator::And).unwrap();
        assert_eq!(b.to_string(), "+(+foo:bar +foo:baz)");
    }

    #[test]
    fn parsed_input_uses_builder_settings() {
        let defaults = Defaults::new(
            Arc::new(TantivyAnalyzer::standard()),
            ParserSettings {
                version: CompatVersion::V2,
                ..ParserSettings::default()
            },
        );
        let mut b = QueryBuilder::with_defaults(&defaults);
        b.match_parsed_input("foo", "wh-addaya", None).unwrap();
        assert_eq!(b.to_string(), "+(foo:wh foo:addaya)");
    }

    #[test]
    fn parsed_input_multi_field() {
        let mut b = builder();
        b.match_parsed_input(["title", "body"], "fox", None)
            .unwrap()
            .match_parsed_input([("title", 2.0)], "Dog", None)
            .unwrap();
        assert_eq!(b.to_string(), "+(title:fox body:fox) +(title:dog^2.0)");
    }

    #[test]
    fn any_parsed_input_is_required_group() {
        let mut b = builder();
        b.exclude()
            .match_any_parsed_input("foo", ["red fox", "dog"])
            .unwrap()
            .match_any_parsed_input("foo", Vec::<String>::new())
            .unwrap();
        assert_eq!(b.to_string(), "+((+foo:red +foo:fox) foo:dog)");
    }

    #[test]
    fn conditionals() {
        let mut b = builder();
        b.if_empty(|b| b.match_term("a", 1))
            .if_empty(|b| b.match_term("never", 1))
            .if_non_empty(|b| b.match_term("b", 2))
            .if_true(false, |b| b.match_term("never", 2))
            .if_false(false, |b| b.match_term("c", 3))
            .if_else(true, |b| b.match_term("d", 4), |b| b.match_term("never", 3))
            .if_else(false, |b| b.match_term("never", 4), |b| b.match_term("e", 5));
        assert_eq!(b.to_string(), "+a:1 +b:2 +c:3 +d:4 +e:5");
    }

    #[test]
    fn into_query_returns_tree() {
        let mut b = builder();
        b.match_term("a", 1);
        let expected = b.build();
        assert_eq!(b.into_query(), expected);
    }
}
