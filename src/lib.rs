//! `exql` — an embeddable micro-language for querying and computing over
//! in-memory data.
//!
//! A program is compiled once into an immutable [`Query`], then evaluated
//! any number of times against different [`Input`] values:
//!
//! ```
//! let query = exql::compile(r#"$["name"]"#).unwrap();
//! let input = exql::Input::Map(vec![("name".into(), "Ada".into())]);
//! assert_eq!(query.evaluate(&input).unwrap(), exql::Output::String("Ada".into()));
//! ```
//!
//! The three subsystems that do the work — [`lexer`], [`parser`], and
//! [`evaluator`] — are private; nothing outside this crate ever sees a raw
//! [`ast::Expr`] or [`ast::Value`]. The only things a host program touches
//! are [`compile`], [`Query`], [`Input`], [`Output`], and the error types in
//! [`error`].

mod ast;
mod builtins;
mod context;
mod error;
mod evaluator;
mod lexer;
mod parser;
mod token;

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub use error::{CompileError, EvalError, LexError, ParseError};

use ast::{Expr, Value};
use context::EvalContext;

/// A compiled expression tree.
///
/// Immutable once built, and safe to share across threads: evaluating it
/// takes the input and the filter-placeholder binding through an explicit,
/// stack-local [`EvalContext`] rather than any state owned by the `Query`
/// itself, so one `Query` can back any number of concurrent `evaluate`
/// calls — see spec §5.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    expr: Expr,
}

/// Compiles `text` into a [`Query`].
///
/// Fails with [`CompileError::EmptyQuery`] if `text` is empty once
/// surrounding whitespace is trimmed, or with a wrapped lexer/parser error
/// for malformed source.
pub fn compile(text: &str) -> Result<Query, CompileError> {
    if text.trim().is_empty() {
        return Err(CompileError::EmptyQuery);
    }
    let expr = parser::parse(text)?;
    log::trace!("compiled query ({} bytes of source)", text.len());
    Ok(Query { expr })
}

impl Query {
    /// Evaluates this query against `input`, decoding the result to the
    /// host-facing [`Output`] type.
    pub fn evaluate(&self, input: &Input) -> Result<Output, EvalError> {
        let value = input.to_value();
        let ctx = EvalContext::new();
        let result = evaluator::eval(&self.expr, &value, &ctx)?;
        Ok(Output::from_value(result))
    }
}

/// A value supplied by the host program as the `$` sigil's binding.
///
/// Covers every type spec.md §4.3 names: a boolean, a decimal number (with
/// `From` impls for every common Rust integer width and a fallible
/// conversion from `f32`/`f64` that preserves the float's own textual
/// representation, per the spec's "converted to decimal preserving its
/// decimal textual representation" rule), a string, an ordered list, and an
/// insertion-ordered string-keyed map.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Input {
    Boolean(bool),
    Number(Decimal),
    String(String),
    List(Vec<Input>),
    Map(Vec<(String, Input)>),
}

impl Input {
    fn to_value(&self) -> Value {
        match self {
            Input::Boolean(b) => Value::Boolean(*b),
            Input::Number(n) => Value::Number(*n),
            Input::String(s) => Value::String(s.clone()),
            Input::List(items) => Value::List(items.iter().map(Input::to_value).collect()),
            Input::Map(pairs) => Value::Map(
                pairs
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), v.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Input::Boolean(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::String(value.to_string())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::String(value)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(items: Vec<T>) -> Self {
        Input::List(items.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_input_from_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Input {
                fn from(value: $t) -> Self {
                    Input::Number(Decimal::from(value))
                }
            }
        )*
    };
}

impl_input_from_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Conversion error for the lossy/fallible numeric widths (`f32`, `f64`):
/// fails only for non-finite values (`NaN`, `±inf`), which have no decimal
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("value is not a finite number")]
pub struct NotFiniteError;

impl TryFrom<f64> for Input {
    type Error = NotFiniteError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Decimal::from_str(&value.to_string())
            .map(Input::Number)
            .map_err(|_| NotFiniteError)
    }
}

impl TryFrom<f32> for Input {
    type Error = NotFiniteError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Decimal::from_str(&value.to_string())
            .map(Input::Number)
            .map_err(|_| NotFiniteError)
    }
}

/// A decoded evaluation result, in the host language's own primitive types.
///
/// Matches spec.md §6's decode boundary exactly: `Number` becomes a 64-bit
/// binary float only here, at the very edge of the system — every internal
/// computation stays in exact decimal.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Output {
    Number(f64),
    String(String),
    Boolean(bool),
    List(Vec<Output>),
    Map(Vec<(Output, Output)>),
}

impl Output {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Number(n) => Output::Number(n.to_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Output::String(s),
            Value::Boolean(b) => Output::Boolean(b),
            Value::List(items) => Output::List(items.into_iter().map(Output::from_value).collect()),
            Value::Map(pairs) => Output::Map(
                pairs
                    .into_iter()
                    .map(|(k, v)| (Output::from_value(k), Output::from_value(v)))
                    .collect(),
            ),
        }
    }
}

/// `serde_json` interop at the embedding boundary: a `serde_json::Value`
/// converts into an [`Input`] (failing on `null`, which has no representable
/// type in this language — spec.md §4.3's "null/unsupported inputs fail"
/// rule), and an [`Output`] converts into a `serde_json::Value`
/// unconditionally (every `Output` variant has a direct JSON counterpart).
impl TryFrom<serde_json::Value> for Input {
    type Error = EvalError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Err(EvalError::IncompatibleTypes { op: "$" }),
            serde_json::Value::Bool(b) => Ok(Input::Boolean(b)),
            serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
                .map(Input::Number)
                .map_err(|_| EvalError::IncompatibleTypes { op: "$" }),
            serde_json::Value::String(s) => Ok(Input::String(s)),
            serde_json::Value::Array(items) => Ok(Input::List(
                items
                    .into_iter()
                    .map(Input::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            serde_json::Value::Object(map) => Ok(Input::Map(
                map.into_iter()
                    .map(|(k, v)| Ok((k, Input::try_from(v)?)))
                    .collect::<Result<Vec<_>, EvalError>>()?,
            )),
        }
    }
}

impl From<Output> for serde_json::Value {
    fn from(value: Output) -> Self {
        match value {
            Output::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Output::String(s) => serde_json::Value::String(s),
            Output::Boolean(b) => serde_json::Value::Bool(b),
            Output::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Output::Map(pairs) => serde_json::Value::Object(
                pairs
                    .into_iter()
                    .map(|(k, v)| (output_key_to_json_string(k), v.into()))
                    .collect(),
            ),
        }
    }
}

fn output_key_to_json_string(key: Output) -> String {
    match key {
        Output::String(s) => s,
        Output::Number(n) => n.to_string(),
        Output::Boolean(b) => b.to_string(),
        other @ (Output::List(_) | Output::Map(_)) => {
            serde_json::Value::from(other).to_string()
        }
    }
}
