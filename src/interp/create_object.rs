//! Proto-like object construction (spec §4.2 "CreateObject").

use crate::activation::Activation;
use crate::node::{evaluate_recorded, propagate_strict, BoxFuture, EvalContext, ExecutableNode};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct CreateObjectNode {
    pub id: i64,
    pub type_name: String,
    pub fields: Vec<(String, Arc<dyn ExecutableNode>)>,
}

impl ExecutableNode for CreateObjectNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let mut values = Vec::with_capacity(self.fields.len());
            let mut named = Vec::with_capacity(self.fields.len());
            for (name, node) in &self.fields {
                let v = evaluate_recorded(node.as_ref(), ctx, activation).await;
                values.push(v.clone());
                named.push((name.clone(), v));
            }
            if let Some(short_circuit) = propagate_strict(&values) {
                return short_circuit;
            }

            let fields: BTreeMap<String, Value> = named.into_iter().collect();
            match ctx.registry.new_value(&self.type_name, fields) {
                Ok(v) => v,
                Err(e) => Value::error(e.to_string()),
            }
        })
    }
}
