//! Map construction (spec §4.2 "CreateMap"). Duplicate keys: last wins,
//! which falls out naturally from inserting into the backing `BTreeMap` in
//! declaration order.

use crate::activation::Activation;
use crate::node::{evaluate_recorded, propagate_strict, BoxFuture, EvalContext, ExecutableNode};
use crate::value::{MapKey, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct CreateMapNode {
    pub id: i64,
    pub entries: Vec<(Arc<dyn ExecutableNode>, Arc<dyn ExecutableNode>)>,
}

impl ExecutableNode for CreateMapNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let mut flat = Vec::with_capacity(self.entries.len() * 2);
            let mut pairs = Vec::with_capacity(self.entries.len());
            for (key_node, value_node) in &self.entries {
                let key = evaluate_recorded(key_node.as_ref(), ctx, activation).await;
                let value = evaluate_recorded(value_node.as_ref(), ctx, activation).await;
                flat.push(key.clone());
                flat.push(value.clone());
                pairs.push((key, value));
            }
            if let Some(short_circuit) = propagate_strict(&flat) {
                return short_circuit;
            }

            let mut map = BTreeMap::new();
            for (key, value) in pairs {
                let key = match MapKey::try_from(&key) {
                    Ok(k) => k,
                    Err(e) => return Value::error_value(e),
                };
                map.insert(key, value);
            }
            Value::map(map)
        })
    }
}
