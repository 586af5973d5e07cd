//! Explicit evaluation context threaded through the evaluator.
//!
//! Carries the value currently bound to the filter placeholder (`_`), if
//! any. This exists so `filter`'s per-element re-evaluation never reaches
//! for a mutable global or thread-local; the binding is just a function
//! argument, like the teacher's `Environment` was for variables, generalized
//! to a single optional slot since this language has no user variables.
//!
//! The placeholder is held by value (cloned on each `filter` iteration)
//! rather than by reference: the element being bound usually comes from a
//! freshly evaluated, locally-owned `Vec<Value>` (e.g. the list argument to
//! `filter`), which does not live past the call that produces it, so a
//! borrowed binding would tie `EvalContext` to a lifetime no single struct
//! could satisfy across nested, independently-scoped evaluations.

use crate::ast::Value;

/// Immutable, cheaply-cloned evaluation state passed by reference to every
/// recursive evaluator call.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    placeholder: Option<Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self { placeholder: None }
    }

    /// Returns a new context with `_` bound to `value`, shadowing any outer
    /// binding for the duration of the nested filter predicate.
    pub fn with_placeholder(&self, value: Value) -> Self {
        Self {
            placeholder: Some(value),
        }
    }

    pub fn placeholder(&self) -> Option<&Value> {
        self.placeholder.as_ref()
    }
}
