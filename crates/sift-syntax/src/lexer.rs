//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of tokens for the parser.

use std::{iter::Peekable, str::Chars};

use crate::error::QueryError;

/// Characters that end a bare term unless escaped.
const TERM_BREAKS: &[char] = &['(', ')', ':', '^', '[', ']', '"', '{', '}', '~'];

/// The shape of a bare term after wildcard detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// No unescaped wildcard characters.
    Plain,
    /// A single trailing unescaped `*` (stripped from the text).
    Prefix,
    /// Unescaped `*` or `?` anywhere else.
    Wildcard,
}

/// A token in the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word with escapes resolved.
    Term {
        /// The term text.
        text: String,
        /// Plain, prefix or wildcard.
        kind: TermKind,
    },

    /// A quoted phrase (the quotes are stripped, content preserved).
    Phrase(String),

    /// A bracketed range, e.g. `[a TO b]` or `{a TO b}`.
    Range {
        /// Lower endpoint text.
        lower: String,
        /// Upper endpoint text.
        upper: String,
        /// Whether the range opened with `[`.
        lower_inclusive: bool,
        /// Whether the range closed with `]`.
        upper_inclusive: bool,
    },

    /// The AND keyword or `&&`.
    And,

    /// The OR keyword or `||`.
    Or,

    /// The NOT keyword or `!`.
    Not,

    /// Required prefix (`+`).
    Plus,

    /// Prohibited prefix (`-`).
    Minus,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// Field prefix (e.g., "title:" produces FieldPrefix("title")).
    FieldPrefix(String),

    /// Boost operator with factor (e.g., "^2.5" produces Boost(2.5)).
    Boost(f32),

    /// Fuzzy or slop operator with an optional number (`~`, `~0.7`, `~2`).
    Tilde(Option<f32>),
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    /// The token.
    pub(crate) token: Token,
    /// Byte offset of the first character of the token.
    pub(crate) offset: usize,
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Creates an error at a specific position.
    fn error_at(&self, message: impl Into<String>, position: usize) -> QueryError {
        QueryError::lex(message, position, self.input)
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Spanned>, QueryError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let offset = self.position;
            match self.next_token()? {
                Some(token) => tokens.push(Spanned { token, offset }),
                None => break,
            }
        }

        Ok(tokens)
    }

    /// Returns the next token, or None if at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, QueryError> {
        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        match ch {
            '"' => self.read_phrase(),
            '[' | '{' => self.read_range(),
            '(' => Ok(Some(self.single(Token::LParen))),
            ')' => Ok(Some(self.single(Token::RParen))),
            '+' => Ok(Some(self.single(Token::Plus))),
            '-' => Ok(Some(self.single(Token::Minus))),
            '!' => Ok(Some(self.single(Token::Not))),
            '^' => self.read_boost(),
            '~' => Ok(Some(self.read_tilde())),
            '&' if self.rest().starts_with("&&") => Ok(Some(self.double(Token::And))),
            '|' if self.rest().starts_with("||") => Ok(Some(self.double(Token::Or))),
            ']' | '}' | ':' => Err(self.error_at(format!("unexpected '{ch}'"), self.position)),
            _ => self.read_term_or_keyword(),
        }
    }

    /// Consumes one character and returns the given token.
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Consumes two characters and returns the given token.
    fn double(&mut self, token: Token) -> Token {
        self.advance();
        self.advance();
        token
    }

    /// The unconsumed remainder of the input.
    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// Reads a quoted phrase.
    fn read_phrase(&mut self) -> Result<Option<Token>, QueryError> {
        let start_pos = self.position;
        self.advance(); // consume opening quote

        let mut content = String::new();

        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance(); // consume closing quote
                    return Ok(Some(Token::Phrase(content)));
                }
                Some(&'\\') => {
                    content.push(self.read_escaped()?);
                }
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => {
                    return Err(self.error_at("unclosed quote", start_pos));
                }
            }
        }
    }

    /// Reads a range expression: `[lower TO upper]`, with `{`/`}` for exclusive ends.
    fn read_range(&mut self) -> Result<Option<Token>, QueryError> {
        let start_pos = self.position;
        let lower_inclusive = self.chars.peek() == Some(&'[');
        self.advance();

        self.skip_whitespace();
        let lower = self.read_range_endpoint(start_pos)?;
        self.skip_whitespace();

        if !self.rest().starts_with("TO") {
            return Err(self.error_at("expected 'TO' in range", self.position));
        }
        self.advance();
        self.advance();

        self.skip_whitespace();
        let upper = self.read_range_endpoint(start_pos)?;
        self.skip_whitespace();

        let upper_inclusive = match self.chars.peek() {
            Some(&']') => true,
            Some(&'}') => false,
            _ => return Err(self.error_at("unclosed range", start_pos)),
        };
        self.advance();

        Ok(Some(Token::Range {
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        }))
    }

    /// Reads one range endpoint, either quoted or a run of non-space characters.
    fn read_range_endpoint(&mut self, start_pos: usize) -> Result<String, QueryError> {
        if self.chars.peek() == Some(&'"') {
            return match self.read_phrase()? {
                Some(Token::Phrase(text)) => Ok(text),
                _ => Err(self.error_at("unclosed range", start_pos)),
            };
        }

        let mut value = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || ch == ']' || ch == '}' {
                break;
            }
            if ch == '\\' {
                value.push(self.read_escaped()?);
                continue;
            }
            value.push(ch);
            self.advance();
        }

        if value.is_empty() {
            return Err(self.error_at("unclosed range", start_pos));
        }
        Ok(value)
    }

    /// Reads a term, keyword (AND, OR, NOT), or field prefix.
    fn read_term_or_keyword(&mut self) -> Result<Option<Token>, QueryError> {
        let mut word = String::new();
        let mut escaped = false;
        let mut wildcards = 0;
        let mut trailing_star = false;

        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || TERM_BREAKS.contains(&ch) {
                if ch == ':' && !word.is_empty() {
                    self.advance(); // consume the colon
                    return Ok(Some(Token::FieldPrefix(word)));
                }
                break;
            }

            if ch == '\\' {
                word.push(self.read_escaped()?);
                escaped = true;
                trailing_star = false;
                continue;
            }

            trailing_star = ch == '*';
            if ch == '*' || ch == '?' {
                if word.is_empty() {
                    return Err(self.error_at(
                        format!("'{ch}' not allowed as first character of a term"),
                        self.position,
                    ));
                }
                wildcards += 1;
            }
            word.push(ch);
            self.advance();
        }

        if word.is_empty() {
            return Ok(None);
        }

        if !escaped {
            match word.as_str() {
                "AND" => return Ok(Some(Token::And)),
                "OR" => return Ok(Some(Token::Or)),
                "NOT" => return Ok(Some(Token::Not)),
                _ => {}
            }
        }

        let kind = match wildcards {
            0 => TermKind::Plain,
            1 if trailing_star && word.len() > 1 => {
                word.pop();
                TermKind::Prefix
            }
            _ => TermKind::Wildcard,
        };

        Ok(Some(Token::Term { text: word, kind }))
    }

    /// Consumes a backslash and returns the character it escapes.
    fn read_escaped(&mut self) -> Result<char, QueryError> {
        let start_pos = self.position;
        self.advance(); // consume '\'
        match self.chars.next() {
            Some(ch) => {
                self.position += ch.len_utf8();
                Ok(ch)
            }
            None => Err(self.error_at("escape character at end of input", start_pos)),
        }
    }

    /// Reads a boost operator (^N or ^N.N).
    fn read_boost(&mut self) -> Result<Option<Token>, QueryError> {
        let start_pos = self.position;
        self.advance(); // consume '^'

        let number = self.read_number();

        if number.is_empty() {
            return Err(self.error_at("expected number after '^'", start_pos));
        }

        match number.parse::<f32>() {
            Ok(factor) => Ok(Some(Token::Boost(factor))),
            Err(_) => Err(self.error_at(format!("invalid boost value: {}", number), start_pos)),
        }
    }

    /// Reads a tilde with its optional number.
    fn read_tilde(&mut self) -> Token {
        self.advance(); // consume '~'
        let number = self.read_number();
        Token::Tilde(number.parse::<f32>().ok())
    }

    /// Reads digits with at most one decimal point.
    fn read_number(&mut self) -> String {
        let mut number = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() || (ch == '.' && !number.contains('.')) {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        number
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Tokenizes a query string, keeping the byte offset of each token.
pub(crate) fn tokenize_spanned(input: &str) -> Result<Vec<Spanned>, QueryError> {
    Lexer::new(input).tokenize()
}

/// Convenience function to tokenize a query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    Ok(tokenize_spanned(input)?
        .into_iter()
        .map(|spanned| spanned.token)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> Token {
        Token::Term {
            text: s.into(),
            kind: TermKind::Plain,
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(tokenize("").unwrap(), vec![]);
    }

    #[test]
    fn whitespace_only() {
        assert_eq!(tokenize("   ").unwrap(), vec![]);
    }

    #[test]
    fn single_term() {
        assert_eq!(tokenize("rust").unwrap(), vec![term("rust")]);
    }

    #[test]
    fn multiple_terms() {
        assert_eq!(
            tokenize("rust async").unwrap(),
            vec![term("rust"), term("async")]
        );
    }

    #[test]
    fn quoted_phrase() {
        assert_eq!(
            tokenize("\"hello world\"").unwrap(),
            vec![Token::Phrase("hello world".into())]
        );
    }

    #[test]
    fn escaped_quote_in_phrase() {
        assert_eq!(
            tokenize(r#""say \"hi\"""#).unwrap(),
            vec![Token::Phrase("say \"hi\"".into())]
        );
    }

    #[test]
    fn unclosed_quote_error() {
        let err = tokenize("\"hello world").unwrap_err();
        assert_eq!(err.position, 0);
        assert!(err.message.contains("unclosed"));
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(
            tokenize("a AND b OR c NOT d").unwrap(),
            vec![
                term("a"),
                Token::And,
                term("b"),
                Token::Or,
                term("c"),
                Token::Not,
                term("d")
            ]
        );
        assert_eq!(
            tokenize("and or not").unwrap(),
            vec![term("and"), term("or"), term("not")]
        );
    }

    #[test]
    fn symbolic_operators() {
        assert_eq!(
            tokenize("a && b || !c").unwrap(),
            vec![
                term("a"),
                Token::And,
                term("b"),
                Token::Or,
                Token::Not,
                term("c")
            ]
        );
    }

    #[test]
    fn single_ampersand_is_part_of_term() {
        assert_eq!(tokenize("at&t").unwrap(), vec![term("at&t")]);
    }

    #[test]
    fn modifiers() {
        assert_eq!(
            tokenize("+rust -deprecated").unwrap(),
            vec![Token::Plus, term("rust"), Token::Minus, term("deprecated")]
        );
    }

    #[test]
    fn hyphen_inside_term() {
        assert_eq!(tokenize("foo-bar").unwrap(), vec![term("foo-bar")]);
    }

    #[test]
    fn parentheses() {
        assert_eq!(
            tokenize("(rust async)").unwrap(),
            vec![Token::LParen, term("rust"), term("async"), Token::RParen]
        );
    }

    #[test]
    fn field_prefix() {
        assert_eq!(
            tokenize("title:guide").unwrap(),
            vec![Token::FieldPrefix("title".into()), term("guide")]
        );
    }

    #[test]
    fn escaped_colon_stays_in_term() {
        assert_eq!(tokenize(r"a\:b").unwrap(), vec![term("a:b")]);
    }

    #[test]
    fn escaped_keyword_is_a_term() {
        assert_eq!(tokenize(r"\AND").unwrap(), vec![term("AND")]);
    }

    #[test]
    fn escape_at_end_error() {
        let err = tokenize("foo\\").unwrap_err();
        assert!(err.message.contains("escape"));
        assert_eq!(err.position, 3);
    }

    #[test]
    fn prefix_term() {
        assert_eq!(
            tokenize("prog*").unwrap(),
            vec![Token::Term {
                text: "prog".into(),
                kind: TermKind::Prefix
            }]
        );
    }

    #[test]
    fn wildcard_term() {
        assert_eq!(
            tokenize("te?t*").unwrap(),
            vec![Token::Term {
                text: "te?t*".into(),
                kind: TermKind::Wildcard
            }]
        );
    }

    #[test]
    fn leading_wildcard_error() {
        let err = tokenize("rust *ust").unwrap_err();
        assert!(err.message.contains("first character"));
        assert_eq!(err.position, 5);
        assert!(tokenize("?ust").is_err());
        assert_eq!(tokenize(r"\*ust").unwrap(), vec![term("*ust")]);
    }

    #[test]
    fn escaped_star_is_plain() {
        assert_eq!(tokenize(r"a\*").unwrap(), vec![term("a*")]);
    }

    #[test]
    fn inclusive_range() {
        assert_eq!(
            tokenize("[a TO z]").unwrap(),
            vec![Token::Range {
                lower: "a".into(),
                upper: "z".into(),
                lower_inclusive: true,
                upper_inclusive: true
            }]
        );
    }

    #[test]
    fn mixed_range() {
        assert_eq!(
            tokenize("{10 TO 20]").unwrap(),
            vec![Token::Range {
                lower: "10".into(),
                upper: "20".into(),
                lower_inclusive: false,
                upper_inclusive: true
            }]
        );
    }

    #[test]
    fn range_missing_to() {
        let err = tokenize("[a z]").unwrap_err();
        assert!(err.message.contains("TO"));
    }

    #[test]
    fn range_unclosed() {
        let err = tokenize("[a TO z").unwrap_err();
        assert!(err.message.contains("unclosed range"));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn tilde_with_and_without_number() {
        assert_eq!(
            tokenize("roam~ roam~0.7").unwrap(),
            vec![
                term("roam"),
                Token::Tilde(None),
                term("roam"),
                Token::Tilde(Some(0.7))
            ]
        );
    }

    #[test]
    fn boost_integer() {
        assert_eq!(
            tokenize("rust^2").unwrap(),
            vec![term("rust"), Token::Boost(2.0)]
        );
    }

    #[test]
    fn boost_float() {
        assert_eq!(
            tokenize("rust^2.5").unwrap(),
            vec![term("rust"), Token::Boost(2.5)]
        );
    }

    #[test]
    fn boost_missing_number() {
        let err = tokenize("rust^").unwrap_err();
        assert!(err.message.contains("expected number"));
    }

    #[test]
    fn boost_followed_by_word() {
        let err = tokenize("wh^addaya(mean").unwrap_err();
        assert!(err.message.contains("expected number"));
        assert_eq!(err.position, 2);
    }

    #[test]
    fn stray_closing_bracket() {
        let err = tokenize("a ] b").unwrap_err();
        assert_eq!(err.position, 2);
    }

    #[test]
    fn spanned_offsets() {
        let tokens = tokenize_spanned("  title:guide  -x").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![2, 8, 15, 16]);
    }
}
