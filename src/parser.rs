//! Recursive-descent parser for the exql expression language.
//!
//! ## Parser architecture
//!
//! The parser holds a [`Lexer`] and pulls tokens from it one at a time,
//! using its one-token peek to decide how to proceed. There is **no
//! operator-precedence ladder** here — see the module-level note below.
//!
//! ### Composition rule — left-to-right, no precedence
//!
//! After parsing a primary/postfix expression, the parser checks whether the
//! next token is a binary operator. If so it consumes the operator, parses
//! another primary/postfix expression for the right-hand side, and folds the
//! two into a new node with the running expression as the left child. This
//! iterative left-fold is what gives `2 + 3 * 4` the tree `(2 + 3) * 4`
//! rather than the precedence-respecting tree a Pratt parser would build —
//! that difference is deliberate, not a bug; see the evaluator's
//! re-association safeguard for the corresponding runtime guarantee.
//!
//! Ternary stays right-associative on top of the flat binary level, and
//! postfix index/slice chains and call argument lists follow a primary
//! before any binary operator is considered.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::ast::Expr;
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::TokenKind;

/// Parses `text` into a complete expression tree.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(Lexer::new(text));
    let expr = parser.expression()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    lexer: Lexer,
}

impl Parser {
    fn new(lexer: Lexer) -> Self {
        Self { lexer }
    }

    /// `expr := ternary`
    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.ternary()
    }

    /// `ternary := binary ('?' expr ':' expr)?`, right-associative because
    /// the branches recurse into [`Parser::expression`] rather than
    /// [`Parser::binary`].
    fn ternary(&mut self) -> Result<Expr, ParseError> {
        let condition = self.binary()?;

        if self.peek_kind()? != TokenKind::Question {
            return Ok(condition);
        }
        self.advance()?;

        let if_true = self.expression()?;
        self.expect(TokenKind::Colon, "':' in ternary expression")?;
        let if_false = self.expression()?;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    /// `binary := primary (binOp primary)*`, folded left-to-right with no
    /// precedence between operators.
    fn binary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.postfix()?;

        while let Some(op) = binary_operator(&self.peek_kind()?) {
            self.advance()?;
            let right = self.postfix()?;
            expr = op(Box::new(expr), Box::new(right));
        }

        Ok(expr)
    }

    /// `primary postfix*`, where `postfix := '[' expr ']' | '[' expr? ':' expr? ']'`.
    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        while self.peek_kind()? == TokenKind::LeftBracket {
            self.advance()?;

            if self.peek_kind()? == TokenKind::Colon {
                self.advance()?;
                let end = self.optional_slice_bound()?;
                self.expect(TokenKind::RightBracket, "']' to close slice")?;
                expr = Expr::Slice {
                    target: Box::new(expr),
                    start: None,
                    end: end.map(Box::new),
                };
                continue;
            }

            let first = self.expression()?;

            if self.peek_kind()? == TokenKind::Colon {
                self.advance()?;
                let end = self.optional_slice_bound()?;
                self.expect(TokenKind::RightBracket, "']' to close slice")?;
                expr = Expr::Slice {
                    target: Box::new(expr),
                    start: Some(Box::new(first)),
                    end: end.map(Box::new),
                };
            } else {
                self.expect(TokenKind::RightBracket, "']' to close index")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(first),
                };
            }
        }

        Ok(expr)
    }

    fn optional_slice_bound(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.peek_kind()? == TokenKind::RightBracket {
            Ok(None)
        } else {
            Ok(Some(self.expression()?))
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.lexer.next_token()?;

        match token.kind {
            TokenKind::Number(lexeme) => {
                let decimal = Decimal::from_str(&lexeme).map_err(|_| ParseError::UndefinedToken {
                    found: format!("number '{lexeme}'"),
                    position: token.position,
                })?;
                Ok(Expr::Number(decimal))
            }
            TokenKind::StringLiteral(s) => Ok(Expr::String(s)),
            TokenKind::Boolean(b) => Ok(Expr::Boolean(b)),
            TokenKind::Dollar => Ok(Expr::Input),
            TokenKind::Underscore => Ok(Expr::Placeholder),

            TokenKind::LeftParen => {
                let inner = self.expression()?;
                self.expect(TokenKind::RightParen, "')' to close parenthesized expression")?;
                Ok(Expr::Block(Box::new(inner)))
            }

            TokenKind::LeftBracket => {
                let elements = self.comma_separated(TokenKind::RightBracket, Self::expression)?;
                self.expect(TokenKind::RightBracket, "']' to close list")?;
                Ok(Expr::List(elements))
            }

            TokenKind::LeftBrace => {
                let pairs = self.comma_separated(TokenKind::RightBrace, |p| {
                    let key = p.expression()?;
                    p.expect(TokenKind::Colon, "':' between map key and value")?;
                    let value = p.expression()?;
                    Ok((key, value))
                })?;
                self.expect(TokenKind::RightBrace, "'}' to close map")?;
                Ok(Expr::Map(pairs))
            }

            TokenKind::Label(name) => {
                if self.peek_kind()? != TokenKind::LeftParen {
                    return Err(ParseError::ExpectedToken {
                        expected: "'(' after function name",
                        found: self.peek_kind()?.to_string(),
                        position: token.position,
                    });
                }
                self.advance()?;
                let args = self.comma_separated(TokenKind::RightParen, Self::expression)?;
                self.expect(TokenKind::RightParen, "')' to close argument list")?;
                Ok(Expr::Function { name, args })
            }

            other => Err(ParseError::UndefinedToken {
                found: other.to_string(),
                position: token.position,
            }),
        }
    }

    /// Parses zero or more comma-separated items up to (but not consuming)
    /// `terminator`. Used for list elements, map pairs, and call arguments.
    fn comma_separated<T>(
        &mut self,
        terminator: TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();

        if self.peek_kind()? == terminator {
            return Ok(items);
        }

        items.push(item(self)?);
        while self.peek_kind()? == TokenKind::Comma {
            self.advance()?;
            if self.peek_kind()? == terminator {
                break;
            }
            items.push(item(self)?);
        }

        Ok(items)
    }

    fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        Ok(self.lexer.peek()?.kind)
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        let token = self.lexer.peek()?;
        if token.kind == kind {
            self.lexer.next_token()?;
            Ok(())
        } else {
            Err(ParseError::ExpectedToken {
                expected,
                found: token.kind.to_string(),
                position: token.position,
            })
        }
    }

    fn expect_eof(&mut self) -> Result<(), ParseError> {
        let token = self.lexer.peek()?;
        if token.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(ParseError::UndefinedToken {
                found: token.kind.to_string(),
                position: token.position,
            })
        }
    }
}


type BinaryCtor = fn(Box<Expr>, Box<Expr>) -> Expr;

fn binary_operator(kind: &TokenKind) -> Option<BinaryCtor> {
    let ctor: BinaryCtor = match kind {
        TokenKind::Plus => Expr::Add,
        TokenKind::Minus => Expr::Subtract,
        TokenKind::Asterisk => Expr::Multiply,
        TokenKind::Slash => Expr::Divide,
        TokenKind::IntegerDivision => Expr::IntegerDivision,
        TokenKind::Modulo => Expr::Modulo,
        TokenKind::Caret => Expr::Exponent,
        TokenKind::Equals => Expr::Equals,
        TokenKind::NotEquals => Expr::NotEquals,
        TokenKind::GreaterThan => Expr::GreaterThan,
        TokenKind::GreaterThanOrEqual => Expr::GreaterThanOrEqual,
        TokenKind::LessThan => Expr::LessThan,
        TokenKind::LessThanOrEqual => Expr::LessThanOrEqual,
        TokenKind::And => Expr::And,
        TokenKind::Or => Expr::Or,
        _ => return None,
    };
    Some(ctor)
}
