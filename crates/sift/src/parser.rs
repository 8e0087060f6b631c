//! Free-text parsing into query trees.
//!
//! [`QueryParser`] binds the syntax parser to one or more default fields, an
//! analyzer and the parser settings, then lowers the syntax tree into a
//! [`QueryNode`]. Lowering decides each clause's occurrence from its
//! conjunction, its modifier and the default operator, analyzes term text,
//! and drops clauses whose text analyzes to nothing.

use std::sync::Arc;

use sift_config::{CompatVersion, Operator, ParserSettings};
use sift_syntax::{Conjunction, Modifier, QueryError, QueryExpr};

use crate::{
    Analyzer, FieldSet,
    tree::{BooleanQuery, Clause, Occur, QueryNode, RangeQuery, RangeValue, Rewrite},
};

/// Parses query-language text against default fields.
#[derive(Clone)]
pub struct QueryParser {
    /// Fields searched by unqualified terms.
    fields: FieldSet,
    /// Analyzer applied to term and phrase text.
    analyzer: Arc<dyn Analyzer>,
    /// Version, default operator, slop and fuzzy settings.
    settings: ParserSettings,
}

impl QueryParser {
    /// Creates a parser for the given fields.
    pub fn new(
        fields: impl Into<FieldSet>,
        analyzer: Arc<dyn Analyzer>,
        settings: ParserSettings,
    ) -> Self {
        Self {
            fields: fields.into(),
            analyzer,
            settings,
        }
    }

    /// Sets the operator used between clauses with no explicit conjunction.
    pub fn set_default_operator(&mut self, operator: Operator) {
        self.settings.default_operator = operator;
    }

    /// The operator used between clauses with no explicit conjunction.
    pub fn default_operator(&self) -> Operator {
        self.settings.default_operator
    }

    /// The fields searched by unqualified terms.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Parses `text` into a query.
    ///
    /// Returns `Ok(None)` when the input is empty or every clause analyzes to
    /// nothing (for example, only stop words).
    pub fn parse(&self, text: &str) -> Result<Option<QueryNode>, QueryError> {
        let Some(query) = sift_syntax::parse(text)? else {
            return Ok(None);
        };
        Ok(self.lower_clauses(&query.clauses, None))
    }

    /// Parses input that is assumed to carry no query syntax.
    ///
    /// The text is analyzed first and its tokens joined with spaces, so
    /// punctuation and operators in the input are discarded.
    pub fn parse_user_input(&self, text: &str) -> Result<Option<QueryNode>, QueryError> {
        self.parse(&self.analyzer.normalize(text))
    }

    /// Lowers a clause list.
    ///
    /// A list that produces exactly one query, where that query came from an
    /// unmodified first clause, collapses to the query itself.
    fn lower_clauses(
        &self,
        clauses: &[sift_syntax::Clause],
        field: Option<&str>,
    ) -> Option<QueryNode> {
        let mut out: Vec<Clause> = Vec::new();
        let mut first_is_plain = false;

        for (i, clause) in clauses.iter().enumerate() {
            if let Some(last) = out.last_mut()
                && last.occur != Occur::MustNot
            {
                if clause.conjunction == Conjunction::And {
                    last.occur = Occur::Must;
                }
                if self.settings.default_operator == Operator::And
                    && clause.conjunction == Conjunction::Or
                {
                    last.occur = Occur::Should;
                }
            }

            let Some(query) = self.lower_clause(clause, field) else {
                continue;
            };
            if i == 0 && clause.modifier == Modifier::None {
                first_is_plain = true;
            }
            out.push(Clause {
                query,
                occur: self.occur(clause),
            });
        }

        if out.len() == 1 && first_is_plain {
            return out.pop().map(|clause| clause.query);
        }
        if out.is_empty() {
            return None;
        }
        Some(out.into_iter().collect::<BooleanQuery>().into())
    }

    /// Occurrence of a clause from its conjunction, modifier and the default operator.
    fn occur(&self, clause: &sift_syntax::Clause) -> Occur {
        if clause.modifier == Modifier::Prohibited {
            return Occur::MustNot;
        }
        let required = match self.settings.default_operator {
            Operator::Or => {
                clause.modifier == Modifier::Required || clause.conjunction == Conjunction::And
            }
            Operator::And => clause.conjunction != Conjunction::Or,
        };
        if required { Occur::Must } else { Occur::Should }
    }

    /// Lowers one clause, applying its field and boost.
    fn lower_clause(
        &self,
        clause: &sift_syntax::Clause,
        field: Option<&str>,
    ) -> Option<QueryNode> {
        let field = clause.field.as_deref().or(field);
        let query = match &clause.expr {
            QueryExpr::Term(text) => self.per_field(field, |f| self.analyzed(f, text, None)),
            QueryExpr::Phrase { text, slop } => {
                let slop = slop.unwrap_or(self.settings.phrase_slop);
                self.per_field(field, |f| self.analyzed(f, text, Some(slop)))
            }
            QueryExpr::Prefix(prefix) => {
                let prefix = prefix.to_lowercase();
                self.per_field(field, |f| {
                    Some(QueryNode::Prefix {
                        field: f.to_string(),
                        prefix: prefix.clone(),
                        rewrite: Rewrite::default(),
                    })
                })
            }
            QueryExpr::Wildcard(pattern) => {
                let pattern = pattern.to_lowercase();
                self.per_field(field, |f| {
                    Some(QueryNode::Wildcard {
                        field: f.to_string(),
                        pattern: pattern.clone(),
                    })
                })
            }
            QueryExpr::Fuzzy { term, similarity } => {
                let term = term.to_lowercase();
                let min_similarity = similarity.unwrap_or(self.settings.fuzzy_min_similarity);
                self.per_field(field, |f| {
                    Some(QueryNode::Fuzzy {
                        field: f.to_string(),
                        term: term.clone(),
                        min_similarity,
                    })
                })
            }
            QueryExpr::Range {
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => self.per_field(field, |f| {
                Some(QueryNode::Range(RangeQuery {
                    field: f.to_string(),
                    lower: range_bound(lower),
                    upper: range_bound(upper),
                    lower_inclusive: *lower_inclusive,
                    upper_inclusive: *upper_inclusive,
                }))
            }),
            QueryExpr::Group(clauses) => self.lower_clauses(clauses, field),
        };
        match clause.boost {
            Some(factor) => query.map(|q| q.boosted(factor)),
            None => query,
        }
    }

    /// Builds a query for an explicit field, or for each default field.
    ///
    /// Several default fields combine as optional clauses, each boosted by
    /// its weight.
    fn per_field(
        &self,
        field: Option<&str>,
        build: impl Fn(&str) -> Option<QueryNode>,
    ) -> Option<QueryNode> {
        if let Some(field) = field {
            return build(field);
        }
        match &self.fields {
            FieldSet::Single(field) => build(field),
            FieldSet::Multi(fields) => {
                let group: BooleanQuery = fields
                    .iter()
                    .filter_map(|(name, boost)| {
                        let query = build(name)?;
                        Some(Clause {
                            query: match boost {
                                Some(factor) => query.boosted(*factor),
                                None => query,
                            },
                            occur: Occur::Should,
                        })
                    })
                    .collect();
                if group.is_empty() {
                    None
                } else {
                    Some(group.into())
                }
            }
        }
    }

    /// Analyzes term or phrase text for one field.
    ///
    /// `phrase_slop` is set for quoted phrases. Unquoted text with several
    /// tokens becomes a phrase under [`CompatVersion::V1`] and a group joined
    /// by the default operator under [`CompatVersion::V2`].
    fn analyzed(&self, field: &str, text: &str, phrase_slop: Option<u32>) -> Option<QueryNode> {
        let mut tokens = self.analyzer.tokenize(text);
        if tokens.len() <= 1 {
            return tokens.pop().map(|token| QueryNode::term(field, token));
        }
        match (phrase_slop, self.settings.version) {
            (Some(slop), _) => Some(QueryNode::phrase(field, tokens, slop)),
            (None, CompatVersion::V1) => Some(QueryNode::phrase(
                field,
                tokens,
                self.settings.phrase_slop,
            )),
            (None, CompatVersion::V2) => {
                let occur = match self.settings.default_operator {
                    Operator::And => Occur::Must,
                    Operator::Or => Occur::Should,
                };
                let group: BooleanQuery = tokens
                    .into_iter()
                    .map(|token| Clause {
                        query: QueryNode::term(field, token),
                        occur,
                    })
                    .collect();
                Some(group.into())
            }
        }
    }
}

/// Lower-cases a range endpoint; `*` leaves the side open.
fn range_bound(text: &str) -> Option<RangeValue> {
    if text == "*" {
        None
    } else {
        Some(RangeValue::Str(text.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TantivyAnalyzer;

    fn parser(fields: impl Into<FieldSet>) -> QueryParser {
        QueryParser::new(
            fields,
            Arc::new(TantivyAnalyzer::standard()),
            ParserSettings::default(),
        )
    }

    fn render(parser: &QueryParser, text: &str) -> String {
        parser
            .parse(text)
            .unwrap()
            .map(|q| q.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn single_term_unwraps() {
        let p = parser("foo");
        assert_eq!(p.parse("bar").unwrap(), Some(QueryNode::term("foo", "bar")));
    }

    #[test]
    fn explicit_field() {
        assert_eq!(render(&parser("foo"), "bar:bap"), "bar:bap");
    }

    #[test]
    fn or_operator_occurrence() {
        let p = parser("foo");
        assert_eq!(render(&p, "bar baz"), "foo:bar foo:baz");
        assert_eq!(render(&p, "bar AND baz"), "+foo:bar +foo:baz");
        assert_eq!(render(&p, "+bar -baz qux"), "+foo:bar -foo:baz foo:qux");
        assert_eq!(render(&p, "bar AND NOT baz"), "+foo:bar -foo:baz");
    }

    #[test]
    fn and_operator_occurrence() {
        let mut p = parser("foo");
        p.set_default_operator(Operator::And);
        assert_eq!(p.default_operator(), Operator::And);
        assert_eq!(render(&p, "bar baz"), "+foo:bar +foo:baz");
        assert_eq!(render(&p, "bar OR baz"), "foo:bar foo:baz");
        assert_eq!(render(&p, "bar -baz"), "+foo:bar -foo:baz");
    }

    #[test]
    fn prohibited_only_is_not_unwrapped() {
        assert_eq!(render(&parser("foo"), "-bar"), "-foo:bar");
        assert!(matches!(
            parser("foo").parse("-bar").unwrap(),
            Some(QueryNode::Boolean(_))
        ));
    }

    #[test]
    fn stop_words_are_dropped() {
        let p = parser("foo");
        assert_eq!(p.parse("the").unwrap(), None);
        let query = p.parse("and what").unwrap().unwrap();
        assert!(matches!(query, QueryNode::Boolean(ref b) if b.len() == 1));
        assert_eq!(query.to_string(), "foo:what");
    }

    #[test]
    fn empty_input() {
        assert_eq!(parser("foo").parse("").unwrap(), None);
        assert_eq!(parser("foo").parse("   ").unwrap(), None);
    }

    #[test]
    fn syntax_errors_surface() {
        assert!(parser("foo").parse("AND what").is_err());
        assert!(parser("foo").parse("wh^addaya(mean").is_err());
        assert!(parser("foo").parse("*fox").is_err());
    }

    #[test]
    fn multi_token_term_v1_is_phrase() {
        let p = parser("foo");
        assert_eq!(render(&p, r"wh\^addaya\(mean"), "foo:\"wh addaya mean\"");
    }

    #[test]
    fn multi_token_term_v2_is_group() {
        let settings = ParserSettings {
            version: CompatVersion::V2,
            ..ParserSettings::default()
        };
        let mut p = QueryParser::new("foo", Arc::new(TantivyAnalyzer::standard()), settings);
        assert_eq!(render(&p, "wh-addaya"), "foo:wh foo:addaya");
        p.set_default_operator(Operator::And);
        assert_eq!(render(&p, "wh-addaya"), "+foo:wh +foo:addaya");
    }

    #[test]
    fn quoted_phrases() {
        let p = parser("foo");
        assert_eq!(render(&p, "\"Quick Brown fox\""), "foo:\"quick brown fox\"");
        assert_eq!(render(&p, "\"quick fox\"~2"), "foo:\"quick fox\"~2");
        assert_eq!(render(&p, "\"Fox\""), "foo:fox");
        assert_eq!(p.parse("\"the\"").unwrap(), None);
    }

    #[test]
    fn configured_phrase_slop() {
        let settings = ParserSettings {
            phrase_slop: 3,
            ..ParserSettings::default()
        };
        let p = QueryParser::new("foo", Arc::new(TantivyAnalyzer::standard()), settings);
        assert_eq!(render(&p, "\"quick fox\""), "foo:\"quick fox\"~3");
        assert_eq!(render(&p, "\"quick fox\"~1"), "foo:\"quick fox\"~1");
    }

    #[test]
    fn field_group() {
        let p = parser("foo");
        assert_eq!(render(&p, "title:(Quick brown)"), "title:quick title:brown");
        assert_eq!(render(&p, "bar +title:(a1 b1)"), "foo:bar +(title:a1 title:b1)");
    }

    #[test]
    fn multi_field_expansion() {
        let p = parser(["title", "body"]);
        assert_eq!(render(&p, "fox"), "title:fox body:fox");
        assert_eq!(render(&p, "fox tag:x"), "(title:fox body:fox) tag:x");
    }

    #[test]
    fn multi_field_boosts() {
        let p = parser([("title", 2.0), ("body", 1.0)]);
        assert_eq!(render(&p, "fox"), "title:fox^2.0 body:fox");
        assert_eq!(render(&p, "fox^3"), "(title:fox^2.0 body:fox)^3.0");
    }

    #[test]
    fn unanalyzed_kinds_are_lowercased() {
        let p = parser("foo");
        assert_eq!(render(&p, "Pre*"), "foo:pre*");
        assert_eq!(render(&p, "Te?t"), "foo:te?t");
        assert_eq!(render(&p, "Roam~"), "foo:roam~0.5");
        assert_eq!(render(&p, "roam~0.8"), "foo:roam~0.8");
        assert_eq!(render(&p, "[A TO *}"), "foo:[a TO *}");
    }

    #[test]
    fn boosts() {
        let p = parser("foo");
        assert_eq!(render(&p, "bar^2"), "foo:bar^2.0");
        assert_eq!(render(&p, "(a1 b1)^2"), "(foo:a1 foo:b1)^2.0");
        assert_eq!(render(&p, "bar^1"), "foo:bar");
    }

    #[test]
    fn outer_boost_replaces_inner() {
        let p = parser("foo");
        assert_eq!(render(&p, "(bar^2)^3"), "foo:bar^3.0");
        assert_eq!(
            p.parse("(bar^2)^3").unwrap(),
            Some(QueryNode::term("foo", "bar").boosted(3.0))
        );
    }

    #[test]
    fn user_input_drops_syntax() {
        let p = parser("foo");
        let query = p.parse_user_input("The Quick-Fox! (AND)").unwrap();
        assert_eq!(query.unwrap().to_string(), "foo:quick foo:fox");
    }
}
