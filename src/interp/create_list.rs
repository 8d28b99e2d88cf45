//! List construction (spec §4.2 "CreateList").

use crate::activation::Activation;
use crate::node::{evaluate_recorded, propagate_strict, BoxFuture, EvalContext, ExecutableNode};
use crate::value::Value;
use std::sync::Arc;

pub struct CreateListNode {
    pub id: i64,
    pub elements: Vec<Arc<dyn ExecutableNode>>,
}

impl ExecutableNode for CreateListNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let mut values = Vec::with_capacity(self.elements.len());
            for element in &self.elements {
                values.push(evaluate_recorded(element.as_ref(), ctx, activation).await);
            }
            if let Some(short_circuit) = propagate_strict(&values) {
                return short_circuit;
            }
            Value::list(values)
        })
    }
}
