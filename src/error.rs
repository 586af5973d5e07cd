//! Closed error-kind sets for compilation and evaluation.
//!
//! Every variant here corresponds to exactly one error kind named in the
//! language specification. Callers match on the variant, not on message
//! text; the `Display` impls (derived by `thiserror`) exist for humans,
//! the variant identity is the contract.

use thiserror::Error;

/// Error raised while turning source text into a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("invalid character '{ch}' at byte offset {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("unexpected end of input inside string literal starting at byte offset {position}")]
    UnexpectedEndOfInput { position: usize },
}

/// Error raised while turning a token stream into an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("no parse rule for {found} at byte offset {position}")]
    UndefinedToken { found: String, position: usize },

    #[error("expected {expected}, found {found} at byte offset {position}")]
    ExpectedToken {
        expected: &'static str,
        found: String,
        position: usize,
    },
}

/// Error raised by [`crate::compile`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("query text is empty")]
    EmptyQuery,

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Error raised while evaluating a compiled [`crate::Query`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("incompatible types for '{op}'")]
    IncompatibleTypes { op: &'static str },

    #[error("division by zero in '{op}'")]
    DivisionByZero { op: &'static str },

    #[error("'{op}' requires a boolean operand")]
    BooleanOperation { op: &'static str },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("invalid index in '{op}'")]
    InvalidIndex { op: &'static str },

    #[error("cannot index this kind of value with this kind of key in '{op}'")]
    InvalidMapIndex { op: &'static str },

    #[error("key not found")]
    KeyNotFound,

    #[error("undefined function '{name}'")]
    UndefinedFunction { name: String },

    #[error("'{name}' expects {expected} argument(s), got {got}")]
    InvalidArgumentCount {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("invalid argument type for '{name}'")]
    InvalidArgumentType { name: &'static str },
}
