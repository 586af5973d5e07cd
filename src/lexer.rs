//! Lexical analyzer for the exql expression language.
//!
//! Converts raw source text into a stream of tokens consumed by
//! [`crate::parser::Parser`].
//!
//! ## Tokenization process
//!
//! 1. **Character processing** — iterates the source character by character.
//! 2. **Token recognition** — numeric and label lexemes first, then string
//!    literals, then punctuation (two-character operators tried before
//!    one-character ones).
//! 3. **Error handling** — reports malformed tokens with a byte offset.
//!
//! Whitespace (space, tab, newline) carries no meaning here — the whole
//! program is a single expression, so unlike a statement-oriented language
//! there is no newline-as-separator role to preserve.

use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Lexical analyzer that converts source code into tokens.
///
/// Holds a character cursor over the source plus an at-most-one-token
/// lookahead buffer, so [`Lexer::peek`] and [`Lexer::next_token`] can be
/// called in either order without re-scanning.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    lookahead: Option<Token>,
}

impl Lexer {
    /// Creates a new lexer for the given source code.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            lookahead: None,
        }
    }

    /// Returns the next token without consuming it. A second call returns
    /// the same token.
    pub fn peek(&mut self) -> Result<Token, LexError> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.scan_token()?);
        }
        Ok(self.lookahead.clone().unwrap())
    }

    /// Returns the next token, advancing the cursor. Drains the lookahead
    /// buffer first if one is pending.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(token) = self.lookahead.take() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Scans and returns the next token from the input stream.
    fn scan_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let start = self.position;
        let Some(c) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, start));
        };

        if c.is_numeric() {
            return self.number_literal(start);
        }
        if c.is_alphabetic() {
            return self.label_or_boolean(start);
        }
        if c == '_' {
            return self.underscore_or_label(start);
        }
        if c == '"' {
            return self.string_literal(start);
        }

        // Two-character operators must be tried before their one-character
        // prefixes (`=`, `!`, `&`, `|`, `/` alone are either invalid or a
        // different token).
        if let Some(kind) = self.two_char_operator() {
            self.advance();
            self.advance();
            return Ok(Token::new(kind, start));
        }

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Modulo,
            '^' => TokenKind::Caret,
            '>' => TokenKind::GreaterThan,
            '<' => TokenKind::LessThan,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '$' => TokenKind::Dollar,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            _ => {
                return Err(LexError::InvalidCharacter {
                    ch: c,
                    position: start,
                })
            }
        };
        self.advance();
        Ok(Token::new(kind, start))
    }

    /// Scans a numeric literal, preserving its source lexeme verbatim so the
    /// parser can build an exact decimal from it later.
    fn number_literal(&mut self, start: usize) -> Result<Token, LexError> {
        let mut lexeme = String::new();

        while let Some(c) = self.peek_char() {
            if c.is_numeric() {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek_char() == Some('.') && self.peek_char_at(1).is_some_and(|c| c.is_numeric()) {
            lexeme.push('.');
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_numeric() {
                    lexeme.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        Ok(Token::new(TokenKind::Number(lexeme), start))
    }

    /// Scans a label, retagging it as a boolean literal when it spells
    /// `true` or `false`.
    fn label_or_boolean(&mut self, start: usize) -> Result<Token, LexError> {
        let lexeme = self.consume_label_chars();
        let kind = match lexeme.as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            _ => TokenKind::Label(lexeme),
        };
        Ok(Token::new(kind, start))
    }

    /// A lone `_` is the placeholder token; `_` immediately followed by more
    /// label characters (`_foo`) is a label whose lexeme starts with `_`.
    fn underscore_or_label(&mut self, start: usize) -> Result<Token, LexError> {
        self.advance();
        if self.peek_char().is_some_and(is_label_char) {
            let rest = self.consume_label_chars();
            return Ok(Token::new(TokenKind::Label(format!("_{rest}")), start));
        }
        Ok(Token::new(TokenKind::Underscore, start))
    }

    fn consume_label_chars(&mut self) -> String {
        let mut lexeme = String::new();
        while let Some(c) = self.peek_char() {
            if is_label_char(c) {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        lexeme
    }

    /// Scans a `"..."` string literal. No escape processing.
    fn string_literal(&mut self, start: usize) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => return Err(LexError::UnexpectedEndOfInput { position: start }),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(Token::new(TokenKind::StringLiteral(value), start))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn two_char_operator(&self) -> Option<TokenKind> {
        let a = self.peek_char_at(0)?;
        let b = self.peek_char_at(1)?;
        match (a, b) {
            ('=', '=') => Some(TokenKind::Equals),
            ('!', '=') => Some(TokenKind::NotEquals),
            ('>', '=') => Some(TokenKind::GreaterThanOrEqual),
            ('<', '=') => Some(TokenKind::LessThanOrEqual),
            ('&', '&') => Some(TokenKind::And),
            ('|', '|') => Some(TokenKind::Or),
            ('/', '/') => Some(TokenKind::IntegerDivision),
            _ => None,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char();
        if c.is_some() {
            self.position += 1;
        }
        c
    }
}

fn is_label_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let done = token.kind == TokenKind::Eof;
            kinds.push(token.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[test]
    fn basic_arithmetic_tokens() {
        assert_eq!(
            tokenize("2 + 3 * 4"),
            vec![
                TokenKind::Number("2".to_string()),
                TokenKind::Plus,
                TokenKind::Number("3".to_string()),
                TokenKind::Asterisk,
                TokenKind::Number("4".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn decimal_number_keeps_its_lexeme() {
        assert_eq!(
            tokenize("3.14"),
            vec![TokenKind::Number("3.14".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_the_number() {
        // `3.` has no digit after the dot, so the dot belongs to whatever
        // follows rather than to the number.
        assert_eq!(
            tokenize("3.len(x)"),
            vec![
                TokenKind::Number("3".to_string()),
                TokenKind::Label("len".to_string()),
                TokenKind::LeftParen,
                TokenKind::Label("x".to_string()),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_win_over_their_prefix() {
        assert_eq!(
            tokenize("a == b != c >= d <= e && f || g // h"),
            vec![
                TokenKind::Label("a".to_string()),
                TokenKind::Equals,
                TokenKind::Label("b".to_string()),
                TokenKind::NotEquals,
                TokenKind::Label("c".to_string()),
                TokenKind::GreaterThanOrEqual,
                TokenKind::Label("d".to_string()),
                TokenKind::LessThanOrEqual,
                TokenKind::Label("e".to_string()),
                TokenKind::And,
                TokenKind::Label("f".to_string()),
                TokenKind::Or,
                TokenKind::Label("g".to_string()),
                TokenKind::IntegerDivision,
                TokenKind::Label("h".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn true_and_false_become_boolean_tokens_not_labels() {
        assert_eq!(
            tokenize("true false"),
            vec![TokenKind::Boolean(true), TokenKind::Boolean(false), TokenKind::Eof]
        );
    }

    #[test]
    fn lone_underscore_is_placeholder_but_underscore_prefix_is_a_label() {
        assert_eq!(
            tokenize("_ _foo"),
            vec![
                TokenKind::Underscore,
                TokenKind::Label("_foo".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_literal_has_no_escape_processing() {
        assert_eq!(
            tokenize(r#""a\nb""#),
            vec![TokenKind::StringLiteral(r"a\nb".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new(r#""unterminated"#);
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnexpectedEndOfInput { position: 0 })
        ));
    }

    #[test]
    fn bare_equals_and_bang_are_invalid_characters() {
        let mut lexer = Lexer::new("=");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::InvalidCharacter { ch: '=', position: 0 })
        ));
    }

    #[test]
    fn peek_is_idempotent_and_does_not_advance() {
        let mut lexer = Lexer::new("+ -");
        let first = lexer.peek().unwrap();
        let second = lexer.peek().unwrap();
        assert_eq!(first.kind, second.kind);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Plus);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Minus);
    }

    #[test]
    fn whitespace_is_insignificant_between_tokens() {
        assert_eq!(tokenize("1+1"), tokenize(" 1 + 1 \n\t"));
    }
}
