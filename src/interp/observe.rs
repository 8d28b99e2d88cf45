//! The Observe decorator (spec §4.1 "Observe"): wraps a node so every value
//! it produces is also reported to an external sink, keyed by expression
//! id. Used to drive cost-tracking/tracing hooks that live outside the
//! core (spec §1 "out of scope"); the core only provides the wrapping
//! point.

use crate::activation::Activation;
use crate::node::{evaluate_recorded, BoxFuture, EvalContext, ExecutableNode};
use crate::value::Value;
use std::sync::Arc;

pub type ObserveFn = Arc<dyn Fn(i64, &Value) + Send + Sync>;

pub struct ObserveNode {
    pub inner: Arc<dyn ExecutableNode>,
    pub sink: ObserveFn,
}

impl ExecutableNode for ObserveNode {
    fn id(&self) -> i64 {
        self.inner.id()
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let value = evaluate_recorded(self.inner.as_ref(), ctx, activation).await;
            (self.sink)(self.id(), &value);
            value
        })
    }
}
