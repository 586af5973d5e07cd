//! The expression tree produced by the parser, and the runtime value domain
//! produced by the evaluator.
//!
//! `Expr` and `Value` are deliberately two separate tagged unions (see
//! DESIGN.md): `Expr` is what a program parses to, and it may still contain
//! an unevaluated `Input` sigil or composite operator nodes, while `Value`
//! is always a fully-evaluated result. Nothing ever constructs a `Value`
//! that needs further evaluation.

use rust_decimal::Decimal;

/// A parsed expression node.
///
/// Every operator is its own tag (rather than, say, one `Binary` variant
/// carrying an operator enum) so the evaluator dispatches with a single
/// flat `match` over the tag, per the "closed tagged union" design note.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Decimal),
    String(String),
    Boolean(bool),
    List(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
    /// The `$` sigil: resolves to the caller-supplied input at evaluation.
    Input,
    /// The `_` placeholder: only meaningful inside a `filter` predicate.
    Placeholder,

    Block(Box<Expr>),

    Add(Box<Expr>, Box<Expr>),
    Subtract(Box<Expr>, Box<Expr>),
    Multiply(Box<Expr>, Box<Expr>),
    Divide(Box<Expr>, Box<Expr>),
    IntegerDivision(Box<Expr>, Box<Expr>),
    Modulo(Box<Expr>, Box<Expr>),
    Exponent(Box<Expr>, Box<Expr>),

    Equals(Box<Expr>, Box<Expr>),
    NotEquals(Box<Expr>, Box<Expr>),
    GreaterThan(Box<Expr>, Box<Expr>),
    GreaterThanOrEqual(Box<Expr>, Box<Expr>),
    LessThan(Box<Expr>, Box<Expr>),
    LessThanOrEqual(Box<Expr>, Box<Expr>),

    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),

    Ternary {
        condition: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },

    Function {
        name: String,
        args: Vec<Expr>,
    },

    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },

    Slice {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
}

impl Expr {
    /// Decodes a literal node directly into a [`Value`], without invoking the
    /// evaluator. Returns `None` for any composite (operator) node; those
    /// must go through [`crate::evaluator::Evaluator::eval`] instead.
    ///
    /// `List`/`Map` literals only decode if every element/key/value is
    /// itself decodable; a list containing e.g. a function call is not a
    /// literal and must be evaluated.
    pub fn decode(&self) -> Option<Value> {
        match self {
            Expr::Number(n) => Some(Value::Number(*n)),
            Expr::String(s) => Some(Value::String(s.clone())),
            Expr::Boolean(b) => Some(Value::Boolean(*b)),
            Expr::List(items) => {
                let values: Option<Vec<Value>> = items.iter().map(Expr::decode).collect();
                values.map(Value::List)
            }
            Expr::Map(pairs) => {
                let values: Option<Vec<(Value, Value)>> = pairs
                    .iter()
                    .map(|(k, v)| Some((k.decode()?, v.decode()?)))
                    .collect();
                values.map(Value::Map)
            }
            _ => None,
        }
    }
}

/// A fully-evaluated runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Decimal),
    String(String),
    Boolean(bool),
    List(Vec<Value>),
    /// Insertion-ordered key/value pairs. Lookup is first-match linear scan
    /// by value-equality, never by hashing; see DESIGN.md and spec §9.
    Map(Vec<(Value, Value)>),
}

/// The relative ordering of value *types* used by `sort` for mixed-type
/// lists: `Number < String < Boolean`.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Boolean(_) => 2,
        Value::List(_) | Value::Map(_) => 3,
    }
}

impl Value {
    /// A short, human-readable name of this value's type, used in error
    /// messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Textual form used by `contains` when the needle is not itself a
    /// string, e.g. `contains("a42b", 42)` checks for the substring `"42"`.
    pub fn display_form(&self) -> String {
        match self {
            Value::Number(n) => n.normalize().to_string(),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::List(_) | Value::Map(_) => self.kind_name().to_string(),
        }
    }

    /// Total order across (possibly mixed) scalar types, used by the `sort`
    /// builtin: primary key is [`type_rank`], secondary key is the value
    /// itself within a type.
    pub fn sort_key_cmp(a: &Value, b: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.cmp(y),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)).then(Ordering::Equal),
        }
    }
}
