//! The program planner (spec §4.1): lowers a checked `Expr` tree into an
//! immutable tree of [`crate::node::ExecutableNode`]s, applying the
//! decorator pipeline along the way. See [`decorators`] for why Optimize,
//! Exhaustive and Observe are implemented the way they are here.

pub mod ast;
mod decorators;

pub use ast::{overload_id, Expr};

use crate::attribute::{Attribute, Qualifier};
use crate::err::Error;
use crate::interp::{
    AttributeNode, CallNode, ComprehensionNode, ConditionalNode, ConstNode, ConstantEqualityNode, CreateListNode,
    CreateMapNode, CreateObjectNode, EqualityNode, FieldExistsNode, InNode, LogicalNode, LogicalOp, ObserveFn, ObserveNode,
    SetMembershipNode,
};
use crate::node::ExecutableNode;
use crate::types::TypeRegistry;
use crate::value::Value;
use std::sync::Arc;

/// Builds executable trees from `Expr` input, applying the decorator
/// pipeline in the deterministic order spec §4.1 prescribes: core lowering,
/// then Optimize, then Exhaustive, then Observe. `optimize`/`exhaustive`
/// are plain flags and `observe` an optional sink rather than a rewriting
/// pass — see [`decorators`].
#[derive(Clone)]
pub struct Planner {
    registry: Arc<dyn TypeRegistry>,
    optimize: bool,
    exhaustive: bool,
    observe: Option<ObserveFn>,
}

impl Planner {
    /// A planner with Optimize on and Exhaustive/Observe off, the default
    /// a host should use for ordinary (non-debugging) evaluation.
    pub fn new(registry: Arc<dyn TypeRegistry>) -> Self {
        Planner {
            registry,
            optimize: true,
            exhaustive: false,
            observe: None,
        }
    }

    /// Disables the Optimize decorator, e.g. for tests that want to
    /// exercise the generic node kinds a specialization would otherwise
    /// replace.
    pub fn without_optimize(mut self) -> Self {
        self.optimize = false;
        self
    }

    /// Enables the Exhaustive decorator (spec §4.1): short-circuit
    /// operators and comprehension folds evaluate every subexpression
    /// regardless of whether the result is already decided.
    pub fn exhaustive(mut self) -> Self {
        self.exhaustive = true;
        self
    }

    /// Installs the Observe decorator (spec §4.1): every node's result is
    /// additionally reported to `sink`, keyed by expression id.
    pub fn observing(mut self, sink: ObserveFn) -> Self {
        self.observe = Some(sink);
        self
    }

    /// Lowers `expr` into an executable tree. Infallible in this
    /// implementation — overload and type-descriptor resolution are
    /// deferred to evaluation time, since the planner trusts a host type
    /// checker already bound every `Call` to a concrete overload id — but
    /// returns `Result` to match the external contract (spec §4.1
    /// guarantee (ii): "fails only with a structured error").
    pub fn plan(&self, expr: &Expr) -> Result<Arc<dyn ExecutableNode>, Error> {
        Ok(self.plan_node(expr))
    }

    fn wrap(&self, node: Arc<dyn ExecutableNode>) -> Arc<dyn ExecutableNode> {
        match &self.observe {
            Some(sink) => Arc::new(ObserveNode { inner: node, sink: sink.clone() }),
            None => node,
        }
    }

    fn plan_node(&self, expr: &Expr) -> Arc<dyn ExecutableNode> {
        let node = self.lower(expr);
        self.wrap(node)
    }

    fn lower(&self, expr: &Expr) -> Arc<dyn ExecutableNode> {
        match expr {
            Expr::Const { id, value } => Arc::new(ConstNode { id: *id, value: value.clone() }),

            Expr::Ident { .. } => Arc::new(AttributeNode {
                attribute: self.plan_attribute(expr).expect("an Ident always lowers to an attribute"),
            }),

            Expr::Select { id, operand, field, test_only: true } => {
                let operand = self.plan_node(operand.as_ref());
                Arc::new(FieldExistsNode { id: *id, operand, field: field.clone() })
            }
            Expr::Select { test_only: false, .. } => Arc::new(AttributeNode {
                attribute: self.plan_attribute(expr).expect("a non-test Select always lowers to an attribute"),
            }),

            Expr::Index { .. } => Arc::new(AttributeNode {
                attribute: self.plan_attribute(expr).expect("an Index always lowers to an attribute"),
            }),

            Expr::Call { .. } => self.plan_call(expr),

            Expr::CreateList { id, elements } => {
                if self.optimize {
                    if let Some(v) = decorators::try_const_eval(expr) {
                        return Arc::new(ConstNode { id: *id, value: v });
                    }
                }
                let elements = elements.iter().map(|e| self.plan_node(e)).collect();
                Arc::new(CreateListNode { id: *id, elements })
            }

            Expr::CreateMap { id, entries } => {
                if self.optimize {
                    if let Some(v) = decorators::try_const_eval(expr) {
                        return Arc::new(ConstNode { id: *id, value: v });
                    }
                }
                let entries = entries.iter().map(|(k, v)| (self.plan_node(k), self.plan_node(v))).collect();
                Arc::new(CreateMapNode { id: *id, entries })
            }

            Expr::CreateObject { id, type_name, fields } => {
                let fields = fields.iter().map(|(n, v)| (n.clone(), self.plan_node(v))).collect();
                Arc::new(CreateObjectNode { id: *id, type_name: type_name.clone(), fields })
            }

            Expr::Comprehension { id, iter_range, iter_var, accu_var, accu_init, loop_condition, loop_step, result } => {
                Arc::new(ComprehensionNode {
                    id: *id,
                    iter_range: self.plan_node(iter_range.as_ref()),
                    iter_var: iter_var.clone(),
                    accu_var: accu_var.clone(),
                    accu_init: self.plan_node(accu_init.as_ref()),
                    loop_condition: self.plan_node(loop_condition.as_ref()),
                    loop_step: self.plan_node(loop_step.as_ref()),
                    result: self.plan_node(result.as_ref()),
                    exhaustive: self.exhaustive,
                })
            }
        }
    }

    fn plan_call(&self, expr: &Expr) -> Arc<dyn ExecutableNode> {
        let Expr::Call { id, overload_id: oid, target, args, .. } = expr else {
            unreachable!("plan_call is only ever invoked on Expr::Call")
        };

        if target.is_none() && args.len() == 3 && oid.as_str() == overload_id::CONDITIONAL {
            return Arc::new(ConditionalNode {
                id: *id,
                cond: self.plan_node(&args[0]),
                truthy: self.plan_node(&args[1]),
                falsy: self.plan_node(&args[2]),
                exhaustive: self.exhaustive,
            });
        }
        if target.is_none() && args.len() == 2 && (oid.as_str() == overload_id::LOGICAL_AND || oid.as_str() == overload_id::LOGICAL_OR) {
            let op = if oid.as_str() == overload_id::LOGICAL_AND { LogicalOp::And } else { LogicalOp::Or };
            return Arc::new(LogicalNode {
                id: *id,
                op,
                lhs: self.plan_node(&args[0]),
                rhs: self.plan_node(&args[1]),
                exhaustive: self.exhaustive,
            });
        }
        if target.is_none() && args.len() == 2 && (oid.as_str() == overload_id::EQUALS || oid.as_str() == overload_id::NOT_EQUALS) {
            return self.plan_equality(*id, oid.as_str() == overload_id::NOT_EQUALS, &args[0], &args[1]);
        }
        if target.is_none() && args.len() == 2 && (oid.as_str() == overload_id::IN_LIST || oid.as_str() == overload_id::IN_MAP) {
            return self.plan_in(*id, &args[0], &args[1]);
        }

        let target_node = target.as_ref().map(|t| self.plan_node(t));
        let arg_nodes = args.iter().map(|a| self.plan_node(a)).collect();
        Arc::new(CallNode { id: *id, overload_id: oid.clone(), target: target_node, args: arg_nodes })
    }

    /// Specializes `attribute == const` / `attribute != const` into a
    /// [`ConstantEqualityNode`] (spec §4.1 Optimize (b)) whenever one side
    /// lowers to an attribute and the other is statically constant; falls
    /// back to the generic [`EqualityNode`] otherwise.
    fn plan_equality(&self, id: i64, negate: bool, lhs: &Expr, rhs: &Expr) -> Arc<dyn ExecutableNode> {
        if self.optimize {
            if let Some(attribute) = self.plan_attribute(lhs) {
                if let Some(constant) = decorators::try_const_eval(rhs) {
                    return Arc::new(ConstantEqualityNode { id, negate, attribute, constant });
                }
            }
            if let Some(attribute) = self.plan_attribute(rhs) {
                if let Some(constant) = decorators::try_const_eval(lhs) {
                    return Arc::new(ConstantEqualityNode { id, negate, attribute, constant });
                }
            }
        }
        Arc::new(EqualityNode { id, negate, lhs: self.plan_node(lhs), rhs: self.plan_node(rhs) })
    }

    /// Specializes `element in [constant, ...]` into a
    /// [`SetMembershipNode`] when the list literal is constant and
    /// homogeneous over a hashable primitive type (spec §4.1 Optimize (c));
    /// falls back to the generic [`InNode`] otherwise, including for `in`
    /// over a map or a non-literal collection.
    fn plan_in(&self, id: i64, element: &Expr, collection: &Expr) -> Arc<dyn ExecutableNode> {
        if self.optimize {
            if let Expr::CreateList { elements, .. } = collection {
                if let Some((member_type_name, set)) = decorators::try_build_set(elements) {
                    return Arc::new(SetMembershipNode {
                        id,
                        element: self.plan_node(element),
                        member_type_name,
                        set: Arc::new(set),
                    });
                }
            }
        }
        Arc::new(InNode { id, element: self.plan_node(element), collection: self.plan_node(collection) })
    }

    /// Lowers `expr` into an [`Attribute`] when it is a variable access or a
    /// chain of field/index qualifiers on one (spec §4.1 "chained
    /// Select/Index collapse into a single attribute where possible"), or
    /// `None` when it is some other kind of subexpression. Callers that
    /// need an attribute regardless fall back to wrapping the planned node
    /// in a fresh `Relative`.
    fn plan_attribute(&self, expr: &Expr) -> Option<Attribute> {
        match expr {
            Expr::Ident { id, name, qualified } => Some(if *qualified {
                Attribute::absolute(*id, name.clone())
            } else {
                Attribute::maybe(*id, name.clone())
            }),

            Expr::Select { id, operand, field, test_only: false } => {
                let mut attribute = self.attribute_or_relative(operand.as_ref());
                attribute.push_qualifier(*id, Qualifier::Field { name: field.clone(), meta: None });
                Some(attribute)
            }

            Expr::Index { id, operand, index } => {
                let mut attribute = self.attribute_or_relative(operand.as_ref());
                let qualifier = self.plan_index_qualifier(index.as_ref());
                attribute.push_qualifier(*id, qualifier);
                Some(attribute)
            }

            // `cond ? a : b` used bare as an attribute (the base of a
            // further Select/Index, or the whole expression itself):
            // which side's qualifiers eventually apply is only known once
            // `cond` is evaluated (spec §3 "Conditional").
            Expr::Call { id, overload_id: oid, target: None, args, .. } if args.len() == 3 && oid.as_str() == overload_id::CONDITIONAL => {
                let cond = self.plan_node(&args[0]);
                let truthy = Box::new(self.attribute_or_relative(&args[1]));
                let falsy = Box::new(self.attribute_or_relative(&args[2]));
                Some(Attribute::Conditional { id: *id, cond, truthy, falsy })
            }

            _ => None,
        }
    }

    /// [`Self::plan_attribute`], falling back to a fresh `Relative`
    /// attribute (with no qualifiers yet) wrapping the planned node when
    /// `expr` does not itself collapse into an attribute chain.
    fn attribute_or_relative(&self, expr: &Expr) -> Attribute {
        self.plan_attribute(expr).unwrap_or_else(|| Attribute::relative(expr.id(), self.plan_node(expr)))
    }

    fn plan_index_qualifier(&self, index: &Expr) -> Qualifier {
        if let Expr::Const { value, .. } = index {
            match value {
                Value::String(s) => return Qualifier::String(s.as_str().to_string()),
                Value::Int(i) => return Qualifier::Int(*i),
                Value::Uint(u) => return Qualifier::Uint(*u),
                Value::Bool(b) => return Qualifier::Bool(*b),
                _ => {}
            }
        }
        Qualifier::Dynamic(self.plan_node(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{EmptyActivation, MapActivation};
    use crate::dispatcher::DispatcherBuilder;
    use crate::node::EvalContext;
    use crate::types::EmptyTypeRegistry;

    fn planner() -> Planner {
        Planner::new(Arc::new(EmptyTypeRegistry))
    }

    fn ctx() -> EvalContext {
        EvalContext::new(DispatcherBuilder::new().build(), Arc::new(EmptyTypeRegistry))
    }

    #[tokio::test]
    async fn const_list_literal_folds_to_a_single_const_node() {
        let expr = Expr::CreateList {
            id: 1,
            elements: vec![Expr::Const { id: 2, value: Value::Int(1) }, Expr::Const { id: 3, value: Value::Int(2) }],
        };
        let plan = planner().plan(&expr).unwrap();
        // A folded CreateList is a bare ConstNode: id stays at the
        // CreateList's own id rather than shifting to the last element.
        assert_eq!(plan.id(), 1);
        let c = ctx();
        let v = plan.evaluate(&c, &EmptyActivation).await;
        assert_eq!(v.to_string(), "[1, 2]");
    }

    #[tokio::test]
    async fn chained_select_collapses_to_one_attribute_node() {
        // msg.a.b, qualified both times.
        let expr = Expr::Select {
            id: 3,
            operand: Box::new(Expr::Select {
                id: 2,
                operand: Box::new(Expr::Ident { id: 1, name: "msg".into(), qualified: true }),
                field: "a".into(),
                test_only: false,
            }),
            field: "b".into(),
            test_only: false,
        };
        let plan = planner().plan(&expr).unwrap();
        assert_eq!(plan.id(), 3);

        let mut inner = BTreeMapValueBuilder::new();
        inner.insert("b", Value::Int(7));
        let mut outer = BTreeMapValueBuilder::new();
        outer.insert("a", inner.build());
        let activation = MapActivation::new().with("msg", outer.build());

        let c = ctx();
        let v = plan.evaluate(&c, &activation).await;
        assert_eq!(v.as_int(), Some(7));
    }

    #[tokio::test]
    async fn equality_against_an_attribute_specializes_to_constant_equality() {
        let expr = Expr::Call {
            id: 2,
            function: "_==_".into(),
            overload_id: overload_id::EQUALS.into(),
            target: None,
            args: vec![Expr::Ident { id: 1, name: "x".into(), qualified: true }, Expr::Const { id: 3, value: Value::Int(5) }],
        };
        let plan = planner().plan(&expr).unwrap();
        let activation = MapActivation::new().with("x", Value::Int(5));
        let c = ctx();
        let v = plan.evaluate(&c, &activation).await;
        assert_eq!(v.as_bool(), Some(true));
    }

    #[tokio::test]
    async fn in_constant_list_specializes_to_set_membership() {
        let expr = Expr::Call {
            id: 4,
            function: "@in".into(),
            overload_id: overload_id::IN_LIST.into(),
            target: None,
            args: vec![
                Expr::Ident { id: 1, name: "x".into(), qualified: true },
                Expr::CreateList {
                    id: 2,
                    elements: vec![
                        Expr::Const { id: 5, value: Value::string("a") },
                        Expr::Const { id: 6, value: Value::string("b") },
                    ],
                },
            ],
        };
        let plan = planner().plan(&expr).unwrap();
        let activation = MapActivation::new().with("x", Value::string("b"));
        let c = ctx();
        let v = plan.evaluate(&c, &activation).await;
        assert_eq!(v.as_bool(), Some(true));
    }

    #[tokio::test]
    async fn without_optimize_falls_back_to_generic_nodes() {
        let expr = Expr::Call {
            id: 2,
            function: "_==_".into(),
            overload_id: overload_id::EQUALS.into(),
            target: None,
            args: vec![Expr::Ident { id: 1, name: "x".into(), qualified: true }, Expr::Const { id: 3, value: Value::Int(5) }],
        };
        let plan = Planner::new(Arc::new(EmptyTypeRegistry)).without_optimize().plan(&expr).unwrap();
        let activation = MapActivation::new().with("x", Value::Int(5));
        let c = ctx();
        let v = plan.evaluate(&c, &activation).await;
        assert_eq!(v.as_bool(), Some(true));
    }

    /// Minimal map-value builder, just for these tests' fixtures.
    struct BTreeMapValueBuilder(std::collections::BTreeMap<crate::value::MapKey, Value>);
    impl BTreeMapValueBuilder {
        fn new() -> Self {
            BTreeMapValueBuilder(std::collections::BTreeMap::new())
        }
        fn insert(&mut self, key: &str, value: Value) {
            self.0.insert(crate::value::MapKey::String(key.into()), value);
        }
        fn build(self) -> Value {
            Value::map(self.0)
        }
    }
}
