//! Partial activations and attribute patterns (spec §3 "Partial"/
//! "AttributePattern", §4.3 "Unknown integration").

use cel_runtime::activation::{AttributePattern, MapActivation, PartialActivation};
use cel_runtime::attribute::{Attribute, Qualifier};
use cel_runtime::dispatcher::DispatcherBuilder;
use cel_runtime::node::EvalContext;
use cel_runtime::types::EmptyTypeRegistry;
use cel_runtime::value::{MapKey, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

fn ctx() -> EvalContext {
    EvalContext::new(DispatcherBuilder::new().build(), Arc::new(EmptyTypeRegistry))
}

/// spec §8 scenario: `a[0]` is a declared, resolvable value but `a[0].c` is
/// covered by an unknown-attribute pattern; the deepest matching qualifier
/// (not the attribute's own id) is reported in the `Unknown`.
#[tokio::test]
async fn deepest_matching_prefix_reports_the_right_id() {
    let mut attr = Attribute::absolute(100, "a");
    attr.push_qualifier(101, Qualifier::Int(0));
    attr.push_qualifier(102, Qualifier::Field { name: "c".into(), meta: None });

    let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
    let base = MapActivation::new().with("a", list);
    let pattern = AttributePattern::new("a").index(0).field("c").build();
    let partial = PartialActivation::new(Arc::new(base), vec![pattern]);

    let c = ctx();
    let v = attr.resolve(&c, &partial).await;
    assert_eq!(v.as_unknown().unwrap().ids(), &[102]);
}

#[tokio::test]
async fn wildcard_qualifier_matches_any_index() {
    let mut attr = Attribute::absolute(1, "a");
    attr.push_qualifier(2, Qualifier::Int(5));

    let base = MapActivation::new().with("a", Value::list(vec![]));
    let pattern = AttributePattern::new("a").wildcard().build();
    let partial = PartialActivation::new(Arc::new(base), vec![pattern]);

    let c = ctx();
    let v = attr.resolve(&c, &partial).await;
    assert!(v.is_unknown());
}

#[tokio::test]
async fn pattern_on_a_different_variable_does_not_match() {
    let mut attr = Attribute::absolute(1, "a");
    attr.push_qualifier(2, Qualifier::Int(0));

    let base = MapActivation::new().with("a", Value::list(vec![Value::Int(42)]));
    let pattern = AttributePattern::new("b").index(0).build();
    let partial = PartialActivation::new(Arc::new(base), vec![pattern]);

    let c = ctx();
    let v = attr.resolve(&c, &partial).await;
    assert_eq!(v.as_int(), Some(42));
}

#[tokio::test]
async fn longest_matching_pattern_wins_when_multiple_match() {
    // Two patterns both match the prefix "a"; "a.b" (depth 1) is more
    // specific than the bare "a" (depth 0) pattern and should win, even
    // though neither is declared first.
    let mut attr = Attribute::absolute(100, "a");
    attr.push_qualifier(101, Qualifier::Field { name: "b".into(), meta: None });

    let mut inner = BTreeMap::new();
    inner.insert(MapKey::String("b".into()), Value::Int(1));
    let base = MapActivation::new().with("a", Value::map(inner));

    let shallow = AttributePattern::new("a").build();
    let deep = AttributePattern::new("a").field("b").build();
    let partial = PartialActivation::new(Arc::new(base), vec![shallow, deep]);

    let c = ctx();
    let v = attr.resolve(&c, &partial).await;
    assert_eq!(v.as_unknown().unwrap().ids(), &[101]);
}

#[tokio::test]
async fn unmatched_attribute_falls_through_to_ordinary_resolution() {
    let attr = Attribute::absolute(1, "x");
    let base = MapActivation::new().with("x", Value::Int(7));
    let partial = PartialActivation::new(Arc::new(base), vec![AttributePattern::new("y").build()]);

    let c = ctx();
    let v = attr.resolve(&c, &partial).await;
    assert_eq!(v.as_int(), Some(7));
}
