//! Activations: layered, read-only name→value environments (spec §3/§4.3).
//!
//! Mirrors the teacher's `ctx::MutableContext` value-lookup chain
//! (`Context::value` walking `parent` on miss), generalized into a small
//! trait so the planner's attribute resolver can be agnostic to whether it
//! is looking at a flat map, a hierarchical chain, or a partial
//! activation carrying unknown-attribute patterns.

mod partial;
mod scope;

pub use partial::{AttributePattern, AttributePatternBuilder, PatternQualifier, QualifierValue};
pub use scope::{PooledScope, ScopePool};

use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A lazily-produced scope value. Permits binding a name to a thunk that
/// is only evaluated (and memoized) on first lookup, matching spec §3's
/// "thunks permit lazy binding of scope locals" and the teacher's
/// `Value::Future`/deferred-compute idiom.
pub enum Binding {
    Value(Value),
    Thunk(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Clone for Binding {
    fn clone(&self) -> Self {
        match self {
            Binding::Value(v) => Binding::Value(v.clone()),
            Binding::Thunk(f) => Binding::Thunk(f.clone()),
        }
    }
}

impl Binding {
    pub fn value(v: Value) -> Self {
        Binding::Value(v)
    }

    pub fn thunk(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Binding::Thunk(Arc::new(f))
    }

    /// Resolves the binding to a concrete value. Thunks are *not* memoized
    /// across calls here — scope entries used by the comprehension fold
    /// are short-lived and looked up at most a handful of times per
    /// iteration, so the simpler non-memoizing resolve keeps the pooled
    /// scope trivially `Clone`-free and avoids interior-mutability
    /// overhead on the hot fold path.
    pub fn resolve(&self) -> Value {
        match self {
            Binding::Value(v) => v.clone(),
            Binding::Thunk(f) => f(),
        }
    }
}

/// A read-only name→value environment.
pub trait Activation: Send + Sync {
    /// Looks up a variable by its fully-qualified name. Returns `None` if
    /// the name is not bound in this activation or any of its ancestors.
    fn resolve(&self, name: &str) -> Option<Value>;

    /// The unknown-attribute patterns in scope, if this activation (or an
    /// ancestor) is partial. Empty for ordinary activations.
    fn unknown_patterns(&self) -> &[AttributePattern] {
        &[]
    }
}

/// The activation with no bindings at all.
#[derive(Default)]
pub struct EmptyActivation;

impl Activation for EmptyActivation {
    fn resolve(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// A flat, map-backed activation. Last-bound-wins is automatic since a
/// `HashMap` insert with an existing key overwrites it.
#[derive(Default)]
pub struct MapActivation {
    bindings: HashMap<String, Binding>,
}

impl MapActivation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), Binding::value(value));
        self
    }

    pub fn with_binding(mut self, name: impl Into<String>, binding: Binding) -> Self {
        self.bindings.insert(name.into(), binding);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), Binding::value(value));
    }
}

impl Activation for MapActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).map(Binding::resolve)
    }
}

/// `(parent, child)`: lookup walks the child first, falling back to the
/// parent on miss. Used both for nested activations supplied by the host
/// and internally for comprehension scope pushes.
pub struct HierarchicalActivation {
    parent: Arc<dyn Activation>,
    child: Arc<dyn Activation>,
}

impl HierarchicalActivation {
    pub fn new(parent: Arc<dyn Activation>, child: Arc<dyn Activation>) -> Self {
        HierarchicalActivation {
            parent,
            child,
        }
    }
}

impl Activation for HierarchicalActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.child.resolve(name).or_else(|| self.parent.resolve(name))
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        let child_patterns = self.child.unknown_patterns();
        if !child_patterns.is_empty() {
            child_patterns
        } else {
            self.parent.unknown_patterns()
        }
    }
}

/// A flat/hierarchical activation augmented with a set of unknown-attribute
/// patterns (spec §3 `Partial`). "Any variable not declared and not
/// matching any pattern is simply not found" — `resolve` here only ever
/// answers ordinary bindings; the pattern set itself is consulted by the
/// attribute resolver in [`crate::attribute`] before it looks at bindings
/// at all, so that a matching pattern wins even over a variable that *is*
/// bound (spec §8 scenario: `a[0]` resolved but `a[0].c` still unknown).
pub struct PartialActivation {
    base: Arc<dyn Activation>,
    patterns: Vec<AttributePattern>,
}

impl PartialActivation {
    pub fn new(base: Arc<dyn Activation>, patterns: Vec<AttributePattern>) -> Self {
        PartialActivation {
            base,
            patterns,
        }
    }
}

impl Activation for PartialActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.base.resolve(name)
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        &self.patterns
    }
}

/// A borrowed-lifetime counterpart to [`HierarchicalActivation`], used
/// internally to push comprehension scopes onto a caller-supplied
/// `&dyn Activation` without forcing it into an `Arc` (spec §9 "Arena +
/// index for folds": the per-iteration scope is short-lived and must not
/// impose allocation beyond the pooled slot itself).
pub struct Chained<'a> {
    parent: &'a dyn Activation,
    child: &'a dyn Activation,
}

impl<'a> Chained<'a> {
    pub fn new(parent: &'a dyn Activation, child: &'a dyn Activation) -> Self {
        Chained { parent, child }
    }
}

impl Activation for Chained<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.child.resolve(name).or_else(|| self.parent.resolve(name))
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        let child_patterns = self.child.unknown_patterns();
        if !child_patterns.is_empty() {
            child_patterns
        } else {
            self.parent.unknown_patterns()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchical_child_shadows_parent() {
        let parent: Arc<dyn Activation> = Arc::new(MapActivation::new().with("x", Value::Int(1)));
        let child: Arc<dyn Activation> = Arc::new(MapActivation::new().with("x", Value::Int(2)));
        let h = HierarchicalActivation::new(parent, child);
        assert_eq!(h.resolve("x").unwrap().as_int(), Some(2));
    }

    #[test]
    fn hierarchical_falls_back_to_parent() {
        let parent: Arc<dyn Activation> = Arc::new(MapActivation::new().with("y", Value::Int(7)));
        let child: Arc<dyn Activation> = Arc::new(MapActivation::new());
        let h = HierarchicalActivation::new(parent, child);
        assert_eq!(h.resolve("y").unwrap().as_int(), Some(7));
        assert!(h.resolve("z").is_none());
    }

    #[test]
    fn thunk_is_evaluated_lazily() {
        use std::sync::atomic::{AtomicBool, Ordering};
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let act = MapActivation::new().with_binding(
            "lazy",
            Binding::thunk(move || {
                flag.store(true, Ordering::SeqCst);
                Value::Int(42)
            }),
        );
        assert!(!called.load(Ordering::SeqCst));
        assert_eq!(act.resolve("lazy").unwrap().as_int(), Some(42));
        assert!(called.load(Ordering::SeqCst));
    }
}
