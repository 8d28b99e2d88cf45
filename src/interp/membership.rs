//! The generic (non-optimized) `in` operator (spec §4.1 `@in`), used when
//! the Optimize decorator did not specialize the call site into a
//! [`super::SetMembershipNode`] (spec §4.1 Optimize (c): only constant,
//! homogeneous-primitive list literals get that treatment).

use crate::activation::Activation;
use crate::err::Error;
use crate::node::{evaluate_recorded, propagate_strict, BoxFuture, EvalContext, ExecutableNode};
use crate::value::{Iterable, Value};
use std::sync::Arc;

pub struct InNode {
    pub id: i64,
    pub element: Arc<dyn ExecutableNode>,
    pub collection: Arc<dyn ExecutableNode>,
}

impl ExecutableNode for InNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let element = evaluate_recorded(self.element.as_ref(), ctx, activation).await;
            let collection = evaluate_recorded(self.collection.as_ref(), ctx, activation).await;
            if let Some(short_circuit) = propagate_strict(&[element.clone(), collection.clone()]) {
                return short_circuit;
            }
            if !collection.is_iterable() {
                return Value::error(Error::NotIterable(collection.type_name().to_string()).to_string());
            }

            let mut found_comparable = false;
            let mut last_error = None;
            for item in collection.iter_values() {
                match element.equals(&item) {
                    Ok(true) => return Value::Bool(true),
                    Ok(false) => found_comparable = true,
                    Err(e) => last_error = Some(e),
                }
            }
            if found_comparable {
                Value::Bool(false)
            } else if let Some(e) = last_error {
                Value::error(e.to_string())
            } else {
                Value::Bool(false)
            }
        })
    }
}
