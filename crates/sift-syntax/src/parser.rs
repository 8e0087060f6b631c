//! Query parser.
//!
//! Parses a token stream into a query AST using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query     → clause (conj? clause)*
//! conj      → "AND" | "&&" | "OR" | "||"
//! clause    → modifier? FIELD_PREFIX? primary
//! modifier  → "+" | "-" | "NOT" | "!"
//! primary   → TERM fuzzy? boost? fuzzy?
//!           | PHRASE slop? boost? slop?
//!           | RANGE boost?
//!           | "(" query ")" boost?
//! ```
//!
//! Keywords are upper-case only; `and`, `or` and `not` are ordinary terms.

use crate::{
    ast::{Clause, Conjunction, Modifier, Query, QueryExpr},
    error::QueryError,
    lexer::{Spanned, TermKind, Token, tokenize_spanned},
};

/// Deepest group nesting accepted; deeper input is rejected as a syntax error.
pub const MAX_DEPTH: usize = 64;

/// Recursive descent parser for query expressions.
struct Parser<'a> {
    /// Token stream to parse.
    tokens: Vec<Spanned>,
    /// Current position in token stream.
    position: usize,
    /// Number of groups currently open.
    depth: usize,
    /// The query text, quoted in errors.
    input: &'a str,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Spanned>, input: &'a str) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            input,
        }
    }

    /// Parses the token stream into a query.
    fn parse(mut self) -> Result<Option<Query>, QueryError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let clauses = self.parse_clauses()?;

        if let Some(token) = self.peek() {
            return Err(self.error(format!("unexpected token: {:?}", token)));
        }

        Ok(Some(Query { clauses }))
    }

    /// Parses: clause (conj? clause)*
    ///
    /// Stops before a closing parenthesis or end of input.
    fn parse_clauses(&mut self) -> Result<Vec<Clause>, QueryError> {
        let mut clauses = vec![self.parse_clause(Conjunction::None)?];

        while let Some(token) = self.peek() {
            let conjunction = match token {
                Token::RParen => break,
                Token::And => {
                    self.advance();
                    Conjunction::And
                }
                Token::Or => {
                    self.advance();
                    Conjunction::Or
                }
                _ => Conjunction::None,
            };
            clauses.push(self.parse_clause(conjunction)?);
        }

        Ok(clauses)
    }

    /// Parses: modifier? FIELD_PREFIX? primary
    fn parse_clause(&mut self, conjunction: Conjunction) -> Result<Clause, QueryError> {
        let modifier = match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                Modifier::Required
            }
            Some(Token::Minus) | Some(Token::Not) => {
                self.advance();
                Modifier::Prohibited
            }
            _ => Modifier::None,
        };

        let field = if let Some(Token::FieldPrefix(name)) = self.peek() {
            let name = name.clone();
            self.advance();
            Some(name)
        } else {
            None
        };

        let (expr, boost) = self.parse_primary(field.as_deref())?;

        Ok(Clause {
            conjunction,
            modifier,
            field,
            expr,
            boost,
        })
    }

    /// Parses a primary expression with its optional fuzzy/slop and boost suffixes.
    fn parse_primary(
        &mut self,
        field: Option<&str>,
    ) -> Result<(QueryExpr, Option<f32>), QueryError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("unexpected end of query"));
        };

        match token {
            Token::Term { text, kind } => {
                self.advance();
                let (tilde, boost) = self.parse_suffixes();
                let expr = match (kind, tilde) {
                    (TermKind::Plain, Some(similarity)) => {
                        if similarity.is_some_and(|sim| !(0.0..=1.0).contains(&sim)) {
                            return Err(self.error(
                                "minimum similarity for a fuzzy term must be between 0 and 1",
                            ));
                        }
                        QueryExpr::Fuzzy {
                            term: text,
                            similarity,
                        }
                    }
                    (TermKind::Plain, None) => QueryExpr::Term(text),
                    (TermKind::Prefix, _) => QueryExpr::Prefix(text),
                    (TermKind::Wildcard, _) => QueryExpr::Wildcard(text),
                };
                Ok((expr, boost))
            }

            Token::Phrase(text) => {
                self.advance();
                let (tilde, boost) = self.parse_suffixes();
                // Slop is an integer; fractional values are truncated.
                let slop = tilde.flatten().map(|n| n as u32);
                Ok((QueryExpr::Phrase { text, slop }, boost))
            }

            Token::Range {
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => {
                self.advance();
                let boost = self.parse_boost();
                Ok((
                    QueryExpr::Range {
                        lower,
                        upper,
                        lower_inclusive,
                        upper_inclusive,
                    },
                    boost,
                ))
            }

            Token::LParen => {
                let open = self.position;
                self.advance(); // consume (
                if self.check(&Token::RParen) {
                    return Err(self.error("empty group"));
                }
                if self.depth == MAX_DEPTH {
                    return Err(QueryError::parse(
                        "query nested too deeply",
                        self.offset_of(open),
                        self.input,
                    ));
                }
                self.depth += 1;
                let clauses = self.parse_clauses()?;
                self.depth -= 1;
                if !self.check(&Token::RParen) {
                    let message = match field {
                        Some(name) => format!("expected closing parenthesis after '{name}:('"),
                        None => "expected closing parenthesis".to_string(),
                    };
                    return Err(QueryError::parse(message, self.offset_of(open), self.input));
                }
                self.advance(); // consume )
                let boost = self.parse_boost();
                Ok((QueryExpr::Group(clauses), boost))
            }

            Token::RParen => Err(self.error("unexpected closing parenthesis")),

            Token::And => Err(self.error("unexpected AND (needs expression before it)")),

            Token::Or => Err(self.error("unexpected OR (needs expression before it)")),

            Token::Plus | Token::Minus | Token::Not => {
                Err(self.error("unexpected modifier (only one modifier per clause)"))
            }

            Token::FieldPrefix(name) => match field {
                Some(outer) => Err(self.error(format!(
                    "expected term, phrase, range, or group after '{outer}:' but found '{name}:'"
                ))),
                None => Err(self.error("unexpected field prefix")),
            },

            Token::Boost(_) => Err(self.error("unexpected boost (needs expression before it)")),

            Token::Tilde(_) => Err(self.error("unexpected '~' (needs expression before it)")),
        }
    }

    /// Parses optional `~N` and `^N` suffixes in either order.
    ///
    /// The outer option of the first element records whether a tilde was present.
    fn parse_suffixes(&mut self) -> (Option<Option<f32>>, Option<f32>) {
        let mut tilde = self.parse_tilde();
        let boost = self.parse_boost();
        if tilde.is_none() && boost.is_some() {
            tilde = self.parse_tilde();
        }
        (tilde, boost)
    }

    /// Consumes a tilde token if present.
    fn parse_tilde(&mut self) -> Option<Option<f32>> {
        if let Some(Token::Tilde(number)) = self.peek() {
            let number = *number;
            self.advance();
            Some(number)
        } else {
            None
        }
    }

    /// Consumes a boost token if present.
    fn parse_boost(&mut self) -> Option<f32> {
        if let Some(Token::Boost(factor)) = self.peek() {
            let factor = *factor;
            self.advance();
            Some(factor)
        } else {
            None
        }
    }

    /// Creates an error at the current token.
    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::parse(message, self.offset_of(self.position), self.input)
    }

    /// Byte offset of the token at `index`, or the input length past the end.
    fn offset_of(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .map(|t| t.offset)
            .unwrap_or(self.input.len())
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    /// Checks if the current token matches the given token.
    fn check(&self, token: &Token) -> bool {
        self.peek().is_some_and(|t| t == token)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a query string into an AST.
///
/// Returns `Ok(None)` for empty queries, `Ok(Some(query))` for valid queries,
/// or `Err(QueryError)` for invalid syntax.
pub fn parse(input: &str) -> Result<Option<Query>, QueryError> {
    let tokens = tokenize_spanned(input)?;
    Parser::new(tokens, input).parse()
}
