//! Tree-walking evaluator for the exql expression language.
//!
//! Dispatches on the tag of each [`Expr`] node, exactly as the teacher's
//! `evaluate_expression` did, but over exact [`Decimal`] arithmetic and real
//! `bool` Booleans rather than the teacher's `f64`-encodes-everything
//! approach. The filter placeholder is threaded through an explicit
//! [`EvalContext`] parameter rather than any shared or global state, so a
//! single immutable [`crate::Query`] can be evaluated from many threads at
//! once.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::ast::{Expr, Value};
use crate::builtins;
use crate::context::EvalContext;
use crate::error::EvalError;

/// Evaluates `expr` against `input` (the already-converted caller value).
pub fn eval(expr: &Expr, input: &Value, ctx: &EvalContext) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Boolean(b) => Ok(Value::Boolean(*b)),
        Expr::Input => Ok(input.clone()),

        Expr::Placeholder => ctx
            .placeholder()
            .cloned()
            .ok_or(EvalError::IncompatibleTypes { op: "_" }),

        Expr::List(items) => {
            let values = items
                .iter()
                .map(|item| eval(item, input, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        }

        Expr::Map(pairs) => {
            let values = pairs
                .iter()
                .map(|(k, v)| Ok((eval(k, input, ctx)?, eval(v, input, ctx)?)))
                .collect::<Result<Vec<_>, EvalError>>()?;
            Ok(Value::Map(values))
        }

        Expr::Block(inner) => eval(inner, input, ctx),

        Expr::Add(left, right) => eval_add(left, right, input, ctx),
        Expr::Multiply(left, right) => {
            let a = as_number(eval(left, input, ctx)?, "*")?;
            let b = as_number(eval(right, input, ctx)?, "*")?;
            Ok(Value::Number(a * b))
        }

        Expr::Subtract(left, right) => {
            eval_arith_chain(ArithOp::Subtract, left, right, input, ctx)
        }
        Expr::Divide(left, right) => eval_arith_chain(ArithOp::Divide, left, right, input, ctx),
        Expr::IntegerDivision(left, right) => {
            eval_arith_chain(ArithOp::IntegerDivision, left, right, input, ctx)
        }
        Expr::Modulo(left, right) => eval_arith_chain(ArithOp::Modulo, left, right, input, ctx),
        Expr::Exponent(left, right) => {
            eval_arith_chain(ArithOp::Exponent, left, right, input, ctx)
        }

        Expr::Equals(left, right) => {
            let (a, b) = (eval(left, input, ctx)?, eval(right, input, ctx)?);
            Ok(Value::Boolean(values_equal(&a, &b, "==")?))
        }
        Expr::NotEquals(left, right) => {
            let (a, b) = (eval(left, input, ctx)?, eval(right, input, ctx)?);
            Ok(Value::Boolean(!values_equal(&a, &b, "!=")?))
        }

        Expr::GreaterThan(left, right) => eval_ordering(left, right, input, ctx, ">", |o| {
            o == std::cmp::Ordering::Greater
        }),
        Expr::GreaterThanOrEqual(left, right) => eval_ordering(left, right, input, ctx, ">=", |o| {
            o != std::cmp::Ordering::Less
        }),
        Expr::LessThan(left, right) => {
            eval_ordering(left, right, input, ctx, "<", |o| o == std::cmp::Ordering::Less)
        }
        Expr::LessThanOrEqual(left, right) => eval_ordering(left, right, input, ctx, "<=", |o| {
            o != std::cmp::Ordering::Greater
        }),

        Expr::And(left, right) => {
            if !as_boolean(eval(left, input, ctx)?, "&&")? {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(as_boolean(eval(right, input, ctx)?, "&&")?))
        }
        Expr::Or(left, right) => {
            if as_boolean(eval(left, input, ctx)?, "||")? {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(as_boolean(eval(right, input, ctx)?, "||")?))
        }

        Expr::Ternary {
            condition,
            if_true,
            if_false,
        } => {
            if as_boolean(eval(condition, input, ctx)?, "?:")? {
                eval(if_true, input, ctx)
            } else {
                eval(if_false, input, ctx)
            }
        }

        Expr::Index { target, index } => eval_index(target, index, input, ctx),
        Expr::Slice { target, start, end } => {
            eval_slice(target, start.as_deref(), end.as_deref(), input, ctx)
        }

        Expr::Function { name, args } => eval_function(name, args, input, ctx),
    }
}

fn eval_add(
    left: &Expr,
    right: &Expr,
    input: &Value,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let a = eval(left, input, ctx)?;
    let b = eval(right, input, ctx)?;
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        _ => Err(EvalError::IncompatibleTypes { op: "+" }),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum ArithOp {
    Subtract,
    Divide,
    IntegerDivision,
    Modulo,
    Exponent,
}

impl ArithOp {
    fn tag(self) -> &'static str {
        match self {
            ArithOp::Subtract => "-",
            ArithOp::Divide => "/",
            ArithOp::IntegerDivision => "//",
            ArithOp::Modulo => "%",
            ArithOp::Exponent => "^",
        }
    }

    fn same_variant<'e>(self, expr: &'e Expr) -> Option<(&'e Expr, &'e Expr)> {
        match (self, expr) {
            (ArithOp::Subtract, Expr::Subtract(l, r)) => Some((l, r)),
            (ArithOp::Divide, Expr::Divide(l, r)) => Some((l, r)),
            (ArithOp::IntegerDivision, Expr::IntegerDivision(l, r)) => Some((l, r)),
            (ArithOp::Modulo, Expr::Modulo(l, r)) => Some((l, r)),
            (ArithOp::Exponent, Expr::Exponent(l, r)) => Some((l, r)),
            _ => None,
        }
    }

    fn apply(self, acc: Decimal, next: Decimal) -> Result<Decimal, EvalError> {
        match self {
            ArithOp::Subtract => Ok(acc - next),
            ArithOp::Divide => {
                if next.is_zero() {
                    return Err(EvalError::DivisionByZero { op: self.tag() });
                }
                Ok(acc / next)
            }
            ArithOp::IntegerDivision => {
                if next.is_zero() {
                    return Err(EvalError::DivisionByZero { op: self.tag() });
                }
                Ok((acc / next).trunc())
            }
            ArithOp::Modulo => {
                if next.is_zero() {
                    return Err(EvalError::DivisionByZero { op: self.tag() });
                }
                Ok(acc % next)
            }
            ArithOp::Exponent => Ok(acc.powd(next)),
        }
    }
}

/// Evaluates a chain of same-operator nodes left-to-right, flattening any
/// right-nested spine first. Parsing already yields left-leaning trees for
/// these operators, so the flattening is a no-op on parser output; it only
/// matters for trees assembled some other way (see the spine-flattening
/// note in [`ArithOp::same_variant`]'s caller).
fn eval_arith_chain(
    op: ArithOp,
    left: &Expr,
    right: &Expr,
    input: &Value,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut operands = vec![left];
    let mut current = right;
    loop {
        match op.same_variant(current) {
            Some((l, r)) => {
                operands.push(l);
                current = r;
            }
            None => {
                operands.push(current);
                break;
            }
        }
    }

    let mut operands = operands.into_iter();
    let first = operands.next().expect("at least one operand");
    let mut acc = as_number(eval(first, input, ctx)?, op.tag())?;

    for operand in operands {
        let next = as_number(eval(operand, input, ctx)?, op.tag())?;
        acc = op.apply(acc, next)?;
    }

    Ok(Value::Number(acc))
}

fn eval_ordering(
    left: &Expr,
    right: &Expr,
    input: &Value,
    ctx: &EvalContext,
    op: &'static str,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, EvalError> {
    let a = eval(left, input, ctx)?;
    let b = eval(right, input, ctx)?;
    let ordering = match (&a, &b) {
        (Value::Number(a), Value::Number(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        _ => return Err(EvalError::IncompatibleTypes { op }),
    };
    Ok(Value::Boolean(accept(ordering)))
}

fn values_equal(a: &Value, b: &Value, op: &'static str) -> Result<bool, EvalError> {
    match (a, b) {
        (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_))
        | (Value::Boolean(_), Value::Boolean(_)) => Ok(a == b),
        _ => Err(EvalError::IncompatibleTypes { op }),
    }
}

fn as_number(value: Value, op: &'static str) -> Result<Decimal, EvalError> {
    match value {
        Value::Number(n) => Ok(n),
        _ => Err(EvalError::IncompatibleTypes { op }),
    }
}

fn as_boolean(value: Value, op: &'static str) -> Result<bool, EvalError> {
    match value {
        Value::Boolean(b) => Ok(b),
        _ => Err(EvalError::BooleanOperation { op }),
    }
}

/// Resolves a (possibly negative) List/String index to an in-bounds usize.
fn resolve_index(target: &Value, index: &Value, op: &'static str) -> Result<usize, EvalError> {
    let Value::Number(n) = index else {
        return Err(EvalError::InvalidIndex { op });
    };
    if n.fract() != Decimal::ZERO {
        return Err(EvalError::InvalidIndex { op });
    }
    let i: i64 = (*n).try_into().map_err(|_| EvalError::InvalidIndex { op })?;
    let len = match target {
        Value::List(items) => items.len(),
        Value::String(s) => s.chars().count(),
        _ => return Err(EvalError::InvalidMapIndex { op }),
    };
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved as usize >= len {
        return Err(EvalError::IndexOutOfBounds { index: i, len });
    }
    Ok(resolved as usize)
}

fn eval_index(
    target: &Expr,
    index: &Expr,
    input: &Value,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let target_value = eval(target, input, ctx)?;
    let index_value = eval(index, input, ctx)?;

    match &target_value {
        Value::List(items) => {
            let i = resolve_index(&target_value, &index_value, "[]")?;
            Ok(items[i].clone())
        }
        Value::String(s) => {
            let i = resolve_index(&target_value, &index_value, "[]")?;
            Ok(Value::String(s.chars().nth(i).unwrap().to_string()))
        }
        Value::Map(pairs) => pairs
            .iter()
            .find(|(key, _)| key == &index_value)
            .map(|(_, value)| value.clone())
            .ok_or(EvalError::KeyNotFound),
        _ => Err(EvalError::InvalidMapIndex { op: "[]" }),
    }
}

/// Clamps a possibly-negative, possibly-omitted slice bound into `[0, len]`.
fn clamp_bound(
    value: Option<&Value>,
    len: usize,
    default: usize,
    op: &'static str,
) -> Result<usize, EvalError> {
    let Some(value) = value else {
        return Ok(default);
    };
    let Value::Number(n) = value else {
        return Err(EvalError::InvalidIndex { op });
    };
    if n.fract() != Decimal::ZERO {
        return Err(EvalError::InvalidIndex { op });
    }
    let i: i64 = (*n).try_into().map_err(|_| EvalError::InvalidIndex { op })?;
    let resolved = if i < 0 { i + len as i64 } else { i };
    Ok(resolved.clamp(0, len as i64) as usize)
}

fn eval_slice(
    target: &Expr,
    start: Option<&Expr>,
    end: Option<&Expr>,
    input: &Value,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let target_value = eval(target, input, ctx)?;
    let start_value = start.map(|e| eval(e, input, ctx)).transpose()?;
    let end_value = end.map(|e| eval(e, input, ctx)).transpose()?;

    match &target_value {
        Value::List(items) => {
            let start = clamp_bound(start_value.as_ref(), items.len(), 0, "[:]")?;
            let end = clamp_bound(end_value.as_ref(), items.len(), items.len(), "[:]")?;
            if start >= end {
                Ok(Value::List(Vec::new()))
            } else {
                Ok(Value::List(items[start..end].to_vec()))
            }
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let start = clamp_bound(start_value.as_ref(), chars.len(), 0, "[:]")?;
            let end = clamp_bound(end_value.as_ref(), chars.len(), chars.len(), "[:]")?;
            if start >= end {
                Ok(Value::String(String::new()))
            } else {
                Ok(Value::String(chars[start..end].iter().collect()))
            }
        }
        _ => Err(EvalError::InvalidMapIndex { op: "[:]" }),
    }
}

fn eval_function(
    name: &str,
    args: &[Expr],
    input: &Value,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    if name == "filter" {
        return eval_filter(args, input, ctx);
    }

    let values = args
        .iter()
        .map(|arg| eval(arg, input, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    builtins::call(name, &values)
}

/// `filter(list, predicate)`. The predicate is an unevaluated expression,
/// re-evaluated once per element with `_` rebound to that element; nested
/// filters shadow the outer binding because each recursive [`eval`] call
/// gets its own [`EvalContext`].
fn eval_filter(args: &[Expr], input: &Value, ctx: &EvalContext) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::InvalidArgumentCount {
            name: "filter",
            expected: "2",
            got: args.len(),
        });
    }

    let list = eval(&args[0], input, ctx)?;
    let Value::List(items) = list else {
        return Err(EvalError::InvalidArgumentType { name: "filter" });
    };

    let predicate = &args[1];
    let mut kept = Vec::new();
    for item in items {
        let inner_ctx = ctx.with_placeholder(item.clone());
        let keep = eval(predicate, input, &inner_ctx)?;
        match keep {
            Value::Boolean(true) => kept.push(item),
            Value::Boolean(false) => {}
            _ => return Err(EvalError::InvalidArgumentType { name: "filter" }),
        }
    }

    Ok(Value::List(kept))
}
