//! Optimize decorator specializations applied by the planner (spec §4.1
//! Optimize (a)/(b)/(c)), exercised end to end through [`Planner::plan`]
//! rather than the decorator helpers directly.

use cel_runtime::activation::{EmptyActivation, MapActivation};
use cel_runtime::dispatcher::DispatcherBuilder;
use cel_runtime::node::EvalContext;
use cel_runtime::planner::{overload_id, Expr, Planner};
use cel_runtime::types::EmptyTypeRegistry;
use cel_runtime::value::Value;
use std::sync::Arc;

fn planner() -> Planner {
    Planner::new(Arc::new(EmptyTypeRegistry))
}

fn ctx() -> EvalContext {
    EvalContext::new(DispatcherBuilder::new().build(), Arc::new(EmptyTypeRegistry))
}

fn equals(id: i64, negate: bool, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Call {
        id,
        function: if negate { "_!=_".into() } else { "_==_".into() },
        overload_id: if negate { overload_id::NOT_EQUALS.into() } else { overload_id::EQUALS.into() },
        target: None,
        args: vec![lhs, rhs],
    }
}

fn in_list(id: i64, element: Expr, elements: Vec<Expr>) -> Expr {
    Expr::Call {
        id,
        function: "@in".into(),
        overload_id: overload_id::IN_LIST.into(),
        target: None,
        args: vec![element, Expr::CreateList { id: id + 1, elements }],
    }
}

/// A constant nested map folds to a single `ConstNode` whose id is the
/// `CreateMap`'s own id, mirroring the `CreateList` folding test already
/// covered inline in `planner::tests`.
#[tokio::test]
async fn const_map_literal_folds_to_a_single_const_node() {
    let expr = Expr::CreateMap {
        id: 10,
        entries: vec![(Expr::Const { id: 11, value: Value::string("k") }, Expr::Const { id: 12, value: Value::Int(5) })],
    };
    let plan = planner().plan(&expr).unwrap();
    assert_eq!(plan.id(), 10);
    let c = ctx();
    let v = plan.evaluate(&c, &EmptyActivation).await;
    assert_eq!(v.to_string(), "{k: 5}");
}

/// `x != 5` specializes to `ConstantEqualityNode` with `negate: true`,
/// same as the `==` case already covered inline, just the other operator.
#[tokio::test]
async fn not_equals_against_an_attribute_also_specializes() {
    let expr = equals(1, true, Expr::Ident { id: 2, name: "x".into(), qualified: true }, Expr::Const { id: 3, value: Value::Int(5) });
    let plan = planner().plan(&expr).unwrap();

    let activation = MapActivation::new().with("x", Value::Int(9));
    let c = ctx();
    let v = plan.evaluate(&c, &activation).await;
    assert_eq!(v.as_bool(), Some(true));
}

/// The constant side may appear on the left of `==` too; specialization
/// is not sensitive to operand order.
#[tokio::test]
async fn constant_equality_specializes_with_the_constant_on_the_left() {
    let expr = equals(1, false, Expr::Const { id: 2, value: Value::Int(5) }, Expr::Ident { id: 3, name: "x".into(), qualified: true });
    let plan = planner().plan(&expr).unwrap();

    let activation = MapActivation::new().with("x", Value::Int(5));
    let c = ctx();
    let v = plan.evaluate(&c, &activation).await;
    assert_eq!(v.as_bool(), Some(true));
}

/// A list of float constants is homogeneous but not over a hashable
/// qualifier-legal primitive type, so the planner falls back to the
/// generic `InNode` instead of a `SetMembershipNode` (spec §4.1 Optimize
/// (c), DESIGN.md's "double/float falls back" decision).
#[tokio::test]
async fn float_list_membership_falls_back_to_generic_in_node() {
    let expr = in_list(
        1,
        Expr::Ident { id: 2, name: "x".into(), qualified: true },
        vec![Expr::Const { id: 3, value: Value::Double(1.5) }, Expr::Const { id: 4, value: Value::Double(2.5) }],
    );
    let plan = planner().plan(&expr).unwrap();
    let activation = MapActivation::new().with("x", Value::Double(2.5));
    let c = ctx();
    let v = plan.evaluate(&c, &activation).await;
    assert_eq!(v.as_bool(), Some(true));
}

/// A list containing a non-constant element (an identifier) can never be
/// specialized; membership still has to fall back to `InNode`.
#[tokio::test]
async fn non_constant_list_membership_falls_back_to_generic_in_node() {
    let expr = in_list(
        1,
        Expr::Const { id: 2, value: Value::Int(1) },
        vec![Expr::Ident { id: 3, name: "y".into(), qualified: true }, Expr::Const { id: 4, value: Value::Int(1) }],
    );
    let plan = planner().plan(&expr).unwrap();
    let activation = MapActivation::new().with("y", Value::Int(9));
    let c = ctx();
    let v = plan.evaluate(&c, &activation).await;
    assert_eq!(v.as_bool(), Some(true));
}

/// `without_optimize` disables set-membership specialization too, not
/// just constant-equality (the inline `planner::tests` module only
/// exercises the equality case).
#[tokio::test]
async fn without_optimize_falls_back_for_set_membership_too() {
    let expr = in_list(
        1,
        Expr::Const { id: 2, value: Value::string("b") },
        vec![Expr::Const { id: 3, value: Value::string("a") }, Expr::Const { id: 4, value: Value::string("b") }],
    );
    let plan = Planner::new(Arc::new(EmptyTypeRegistry)).without_optimize().plan(&expr).unwrap();
    let c = ctx();
    let v = plan.evaluate(&c, &EmptyActivation).await;
    assert_eq!(v.as_bool(), Some(true));
}
