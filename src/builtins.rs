//! The fixed built-in function library.
//!
//! Every function here is dispatched by name from [`crate::evaluator::eval`]
//! (except `filter`, whose predicate argument must stay unevaluated; that
//! one is handled directly in the evaluator instead of going through
//! [`call`]). Unlike the teacher's `BuiltinFunctions` registry, which builds
//! a `HashMap<String, fn(...)>` once at interpreter start, dispatch here is a
//! plain `match` over the name: the table is never mutated, so there is
//! nothing to build and nothing that could drift out of sync with a
//! hand-maintained map.

use rust_decimal::Decimal;

use crate::ast::Value;
use crate::error::EvalError;

/// Dispatches a call to a fixed-arity/fixed-type built-in by name.
///
/// `filter` is not reachable through here; see the module doc.
pub fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "len" => len(args),
        "abs" => abs(args),
        "min" => min_max("min", args, |a, b| a.min(b)),
        "max" => min_max("max", args, |a, b| a.max(b)),
        "round" => round(args),
        "floor" => unary_numeric("floor", args, |n| n.floor()),
        "ceil" => unary_numeric("ceil", args, |n| n.ceil()),
        "contains" => contains(args),
        "sort" => sort(args),
        "filter" => unreachable!("filter is intercepted before reaching builtins::call"),
        _ => Err(EvalError::UndefinedFunction {
            name: name.to_string(),
        }),
    }
}

fn arity_error(name: &'static str, expected: &'static str, got: usize) -> EvalError {
    EvalError::InvalidArgumentCount {
        name,
        expected,
        got,
    }
}

fn type_error(name: &'static str) -> EvalError {
    EvalError::InvalidArgumentType { name }
}

/// `len(x)`: element count for String (Unicode scalar values), List, or Map.
fn len(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("len", "1", args.len()));
    }
    let count = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(pairs) => pairs.len(),
        _ => return Err(type_error("len")),
    };
    Ok(Value::Number(Decimal::from(count)))
}

/// `abs(x)`: absolute value of a Number.
fn abs(args: &[Value]) -> Result<Value, EvalError> {
    unary_numeric("abs", args, |n| n.abs())
}

fn unary_numeric(
    name: &'static str,
    args: &[Value],
    f: impl Fn(Decimal) -> Decimal,
) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(arity_error(name, "1", args.len()));
    }
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(f(*n))),
        _ => Err(type_error(name)),
    }
}

/// `round(x)`: rounds to the nearest integer, ties toward positive infinity
/// (so `0.5 -> 1` and `-0.5 -> 0`, per the worked example in the language
/// spec; see DESIGN.md for why this beats `rust_decimal`'s named midpoint
/// strategies here).
fn round(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("round", "1", args.len()));
    }
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(round_half_up(*n))),
        _ => Err(type_error("round")),
    }
}

fn round_half_up(n: Decimal) -> Decimal {
    let floor = n.floor();
    if n - floor >= Decimal::new(5, 1) {
        floor + Decimal::ONE
    } else {
        floor
    }
}

/// `min(...)`/`max(...)`: at least two arguments after any List argument is
/// spliced in place; every resulting element must be a Number.
fn min_max(
    name: &'static str,
    args: &[Value],
    pick: impl Fn(Decimal, Decimal) -> Decimal,
) -> Result<Value, EvalError> {
    let numbers = expand_numeric_args(name, args)?;
    if numbers.len() < 2 {
        return Err(arity_error(name, "at least 2 (after list expansion)", numbers.len()));
    }
    let mut it = numbers.into_iter();
    let first = it.next().expect("checked len >= 2 above");
    Ok(Value::Number(it.fold(first, pick)))
}

/// Splices any List arguments in place, in order, then requires every
/// resulting element to be a Number.
fn expand_numeric_args(name: &'static str, args: &[Value]) -> Result<Vec<Decimal>, EvalError> {
    let mut numbers = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Value::Number(n) => numbers.push(*n),
            Value::List(items) => {
                for item in items {
                    match item {
                        Value::Number(n) => numbers.push(*n),
                        _ => return Err(type_error(name)),
                    }
                }
            }
            _ => return Err(type_error(name)),
        }
    }
    Ok(numbers)
}

/// `contains(haystack, needle)`:
/// - `(List, any)`: element membership by value equality.
/// - `(String, String)`: substring match; a non-String needle is matched by
///   its [`Value::display_form`].
/// - `(Map, key)`: key presence by value equality.
fn contains(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(arity_error("contains", "2", args.len()));
    }
    let found = match (&args[0], &args[1]) {
        (Value::List(items), needle) => items.contains(needle),
        (Value::String(haystack), needle) => {
            let needle = match needle {
                Value::String(s) => s.clone(),
                other => other.display_form(),
            };
            haystack.contains(&needle)
        }
        (Value::Map(pairs), key) => pairs.iter().any(|(k, _)| k == key),
        _ => return Err(type_error("contains")),
    };
    Ok(Value::Boolean(found))
}

/// `sort(x)`: stable ascending sort. Lists sort by [`Value::sort_key_cmp`]
/// (mixed-type lists order by type rank Number < String < Boolean first);
/// a String sorts its Unicode scalar values and returns a String.
fn sort(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("sort", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) => {
            let mut sorted = items.clone();
            sorted.sort_by(Value::sort_key_cmp);
            Ok(Value::List(sorted))
        }
        Value::String(s) => {
            let mut chars: Vec<char> = s.chars().collect();
            chars.sort_unstable();
            Ok(Value::String(chars.into_iter().collect()))
        }
        _ => Err(type_error("sort")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> Value {
        Value::Number(Decimal::from(n))
    }

    #[test]
    fn len_counts_each_kind() {
        assert_eq!(len(&[Value::String("hello".into())]).unwrap(), num(5));
        assert_eq!(len(&[Value::List(vec![num(1), num(2)])]).unwrap(), num(2));
        assert_eq!(
            len(&[Value::Map(vec![(Value::String("a".into()), num(1))])]).unwrap(),
            num(1)
        );
    }

    #[test]
    fn len_rejects_non_container() {
        assert!(matches!(
            len(&[Value::Boolean(true)]),
            Err(EvalError::InvalidArgumentType { name: "len" })
        ));
    }

    #[test]
    fn min_and_max_pick_extremes() {
        assert_eq!(call("min", &[num(3), num(1), num(2)]).unwrap(), num(1));
        assert_eq!(call("max", &[num(3), num(1), num(2)]).unwrap(), num(3));
    }

    #[test]
    fn min_splices_list_arguments() {
        let args = [Value::List(vec![num(5), num(2)]), num(9)];
        assert_eq!(call("min", &args).unwrap(), num(2));
    }

    #[test]
    fn min_requires_at_least_two_numbers() {
        assert!(matches!(
            call("min", &[num(1)]),
            Err(EvalError::InvalidArgumentCount { name: "min", .. })
        ));
    }

    #[test]
    fn round_ties_toward_positive_infinity() {
        assert_eq!(
            round(&[Value::Number(Decimal::new(-5, 1))]).unwrap(),
            num(0)
        );
        assert_eq!(
            round(&[Value::Number(Decimal::new(25, 1))]).unwrap(),
            num(3)
        );
    }

    #[test]
    fn contains_checks_list_string_and_map() {
        assert_eq!(
            contains(&[Value::List(vec![num(1), num(2)]), num(2)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            contains(&[Value::String("a42b".into()), num(42)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            contains(&[
                Value::Map(vec![(Value::String("k".into()), num(1))]),
                Value::String("k".into())
            ])
            .unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn sort_orders_mixed_types_by_rank_then_value() {
        let input = Value::List(vec![Value::Boolean(true), Value::String("hi".into()), num(42)]);
        let Value::List(sorted) = sort(&[input]).unwrap() else {
            panic!("expected list");
        };
        assert_eq!(sorted, vec![num(42), Value::String("hi".into()), Value::Boolean(true)]);
    }

    #[test]
    fn sort_on_string_sorts_scalar_values() {
        assert_eq!(
            sort(&[Value::String("dcba".into())]).unwrap(),
            Value::String("abcd".into())
        );
    }

    #[test]
    fn undefined_function_is_rejected() {
        assert!(matches!(
            call("nope", &[]),
            Err(EvalError::UndefinedFunction { name }) if name == "nope"
        ));
    }
}
