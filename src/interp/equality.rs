//! `==` / `!=` evaluation, and the constant-equality specialization (spec
//! §4.2 "Equality / Inequality").

use crate::activation::Activation;
use crate::attribute::Attribute;
use crate::node::{evaluate_recorded, propagate_strict, BoxFuture, EvalContext, ExecutableNode};
use crate::value::Value;
use std::sync::Arc;

pub struct EqualityNode {
    pub id: i64,
    pub negate: bool,
    pub lhs: Arc<dyn ExecutableNode>,
    pub rhs: Arc<dyn ExecutableNode>,
}

impl ExecutableNode for EqualityNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let lhs = evaluate_recorded(self.lhs.as_ref(), ctx, activation).await;
            let rhs = evaluate_recorded(self.rhs.as_ref(), ctx, activation).await;
            if let Some(short_circuit) = propagate_strict(&[lhs.clone(), rhs.clone()]) {
                return short_circuit;
            }
            match lhs.equals(&rhs) {
                Ok(b) => Value::Bool(b ^ self.negate),
                Err(e) => Value::error(e.to_string()),
            }
        })
    }
}

/// Planner-level optimization of `attribute == const` / `attribute != const`
/// (spec §4.1 Optimize (b)): resolves the attribute and compares its native
/// form to the stored constant directly, skipping the generic two-operand
/// `CallNode`/`EqualityNode` indirection. Per spec §9 open question (c), an
/// `Unknown`/`Error` result from the attribute side propagates before the
/// constant compare is ever attempted.
pub struct ConstantEqualityNode {
    pub id: i64,
    pub negate: bool,
    pub attribute: Attribute,
    pub constant: Value,
}

impl ExecutableNode for ConstantEqualityNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let resolved = self.attribute.resolve(ctx, activation).await;
            if resolved.is_error_or_unknown() {
                return resolved;
            }
            match resolved.equals(&self.constant) {
                Ok(b) => Value::Bool(b ^ self.negate),
                Err(e) => Value::error(e.to_string()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatcherBuilder;
    use crate::interp::const_node::ConstNode;
    use crate::types::EmptyTypeRegistry;
    use crate::activation::EmptyActivation;

    fn ctx() -> EvalContext {
        EvalContext::new(DispatcherBuilder::new().build(), Arc::new(EmptyTypeRegistry))
    }

    #[tokio::test]
    async fn equality_negates_for_not_equals() {
        let node = EqualityNode {
            id: 1,
            negate: true,
            lhs: Arc::new(ConstNode { id: 2, value: Value::Int(1) }),
            rhs: Arc::new(ConstNode { id: 3, value: Value::Int(1) }),
        };
        let c = ctx();
        let v = node.evaluate(&c, &EmptyActivation).await;
        assert_eq!(v.as_bool(), Some(false));
    }

    #[tokio::test]
    async fn incomparable_types_yield_error() {
        let node = EqualityNode {
            id: 1,
            negate: false,
            lhs: Arc::new(ConstNode { id: 2, value: Value::Bool(true) }),
            rhs: Arc::new(ConstNode { id: 3, value: Value::Int(1) }),
        };
        let c = ctx();
        let v = node.evaluate(&c, &EmptyActivation).await;
        assert!(v.is_error());
    }
}
