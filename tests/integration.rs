//! End-to-end and property tests against the public `exql` API only — no
//! internal module is reachable from here, matching how a host program
//! would actually use this crate.

use exql::{compile, CompileError, EvalError, Input, Output};
use proptest::prelude::*;

#[test]
fn input_round_trips_through_the_dollar_sigil() {
    let query = compile("$").unwrap();

    assert_eq!(
        query.evaluate(&Input::Boolean(false)).unwrap(),
        Output::Boolean(false)
    );
    assert_eq!(
        query.evaluate(&Input::String("hi".into())).unwrap(),
        Output::String("hi".into())
    );
    let list: Input = vec![1, 2, 3].into();
    assert_eq!(
        query.evaluate(&list).unwrap(),
        Output::List(vec![Output::Number(1.0), Output::Number(2.0), Output::Number(3.0)])
    );
}

#[test]
fn slice_with_defaulted_bounds_equals_the_whole_list() {
    let query = compile("$[:]").unwrap();
    let list: Input = vec![10, 20, 30].into();
    assert_eq!(
        query.evaluate(&list).unwrap(),
        Output::List(vec![Output::Number(10.0), Output::Number(20.0), Output::Number(30.0)])
    );
}

#[test]
fn slice_with_start_past_end_is_empty() {
    let query = compile("$[2:0]").unwrap();
    let list: Input = vec![10, 20, 30].into();
    assert_eq!(query.evaluate(&list).unwrap(), Output::List(vec![]));
}

#[test]
fn negative_slice_bounds_count_from_the_end() {
    // The grammar has no unary minus, so a negative bound has to be written
    // as a subtraction; `0 - 3` evaluates to the same Number a literal `-3`
    // would denote if the grammar allowed one.
    let query = compile(r#""hello"[0 - 3 : 0 - 1]"#).unwrap();
    assert_eq!(
        query.evaluate(&Input::Boolean(true)).unwrap(),
        Output::String("ll".into())
    );
}

#[test]
fn and_short_circuits_before_a_type_error() {
    let query = compile(r#"false && (1 + "x" == 1)"#).unwrap();
    assert_eq!(
        query.evaluate(&Input::Boolean(true)).unwrap(),
        Output::Boolean(false)
    );
}

#[test]
fn or_short_circuits_before_a_division_by_zero() {
    let query = compile("true || (1 / 0 == 1)").unwrap();
    assert_eq!(
        query.evaluate(&Input::Boolean(true)).unwrap(),
        Output::Boolean(true)
    );
}

#[test]
fn ternary_never_evaluates_the_other_branch() {
    let query = compile(r#"true ? "ok" : (1 / 0)"#).unwrap();
    assert_eq!(
        query.evaluate(&Input::Boolean(true)).unwrap(),
        Output::String("ok".into())
    );
}

#[test]
fn nested_ternary_is_right_associative() {
    // a ? b : c ? d : e  ==  a ? b : (c ? d : e)
    let query = compile("false ? 1 : true ? 2 : 3").unwrap();
    assert_eq!(
        query.evaluate(&Input::Boolean(true)).unwrap(),
        Output::Number(2.0)
    );
}

#[test]
fn nested_filter_does_not_leak_its_placeholder_into_the_outer_one() {
    // The inner filter rebinds `_` to elements of [10, 20]; once it returns,
    // the trailing `== _` must still see the *outer* element, not whatever
    // the inner filter last bound. If the placeholder were carried in
    // mutable/shared state instead of an explicit per-call context, this
    // would come back with the wrong elements kept (or none).
    let query = compile("filter([1,2,3], _ + len(filter([10,20], _ > 100)) == _)").unwrap();
    assert_eq!(
        query.evaluate(&Input::Boolean(true)).unwrap(),
        Output::List(vec![Output::Number(1.0), Output::Number(2.0), Output::Number(3.0)])
    );
}

#[test]
fn map_lookup_is_first_match_on_duplicate_keys() {
    let query = compile(r#"{"a": 1, "a": 2}["a"]"#).unwrap();
    assert_eq!(
        query.evaluate(&Input::Boolean(true)).unwrap(),
        Output::Number(1.0)
    );
}

#[test]
fn empty_source_is_empty_query() {
    assert!(matches!(compile(""), Err(CompileError::EmptyQuery)));
}

#[test]
fn key_not_found_is_reported() {
    let query = compile(r#"{"a": 1}["b"]"#).unwrap();
    assert!(matches!(
        query.evaluate(&Input::Boolean(true)),
        Err(EvalError::KeyNotFound)
    ));
}

proptest! {
    /// Invariant #2/#3: for any two numeric operators drawn from the same
    /// left-to-right arithmetic chain, textual order is evaluation order.
    /// `a - b - c` must equal `(a - b) - c`, never `a - (b - c)`. Operands
    /// are generated non-negative because the grammar has no unary minus —
    /// a negative *result* is still exercised via subtraction itself.
    #[test]
    fn subtraction_chain_is_left_to_right(a in 0i64..1000, b in 0i64..1000, c in 0i64..1000) {
        let text = format!("{a} - {b} - {c}");
        let query = compile(&text).unwrap();
        let Output::Number(got) = query.evaluate(&Input::Boolean(true)).unwrap() else {
            panic!("expected a number");
        };
        let expected = (a - b) - c;
        prop_assert_eq!(got, expected as f64);
    }

    /// Same invariant for `+ *`: `a + b * c` must equal `(a + b) * c`.
    #[test]
    fn no_operator_precedence_between_plus_and_star(a in 0i64..100, b in 0i64..100, c in 0i64..100) {
        let text = format!("{a} + {b} * {c}");
        let query = compile(&text).unwrap();
        let Output::Number(got) = query.evaluate(&Input::Boolean(true)).unwrap() else {
            panic!("expected a number");
        };
        let expected = (a + b) * c;
        prop_assert_eq!(got, expected as f64);
    }

    /// Invariant #4: `false && x` never evaluates `x`, for any well-typed
    /// expression `x` — modeled here by an `x` that would always fail if
    /// evaluated (division by zero).
    #[test]
    fn and_never_evaluates_right_when_left_is_false(_unused in 0..1i32) {
        let query = compile("false && (1 / 0 == 0)").unwrap();
        prop_assert_eq!(
            query.evaluate(&Input::Boolean(true)).unwrap(),
            Output::Boolean(false)
        );
    }

    /// Invariant #6: indexing a list at `i` returns the `i`-th inserted
    /// element, for every in-bounds `i`. Elements are generated non-negative
    /// for the same reason as above — the grammar has no unary minus, so a
    /// literal like `-5` isn't a valid list element in source text.
    #[test]
    fn list_index_returns_the_ith_inserted_element(items in prop::collection::vec(0i64..1000, 1..20)) {
        let idx = items.len() / 2;
        let rendered: Vec<String> = items.iter().map(|n| n.to_string()).collect();
        let text = format!("[{}][{}]", rendered.join(","), idx);
        let query = compile(&text).unwrap();
        let Output::Number(got) = query.evaluate(&Input::Boolean(true)).unwrap() else {
            panic!("expected a number");
        };
        prop_assert_eq!(got, items[idx] as f64);
    }
}
