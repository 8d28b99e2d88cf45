//! Function/method call evaluation (spec §4.2 "Call", §4.4).

use crate::activation::Activation;
use crate::async_driver::CallLookup;
use crate::node::{evaluate_recorded, propagate_strict, BoxFuture, EvalContext, ExecutableNode};
use crate::value::{Receiver, Value};
use std::sync::Arc;

pub struct CallNode {
    pub id: i64,
    pub overload_id: String,
    pub target: Option<Arc<dyn ExecutableNode>>,
    pub args: Vec<Arc<dyn ExecutableNode>>,
}

impl ExecutableNode for CallNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let mut operands = Vec::with_capacity(self.args.len() + 1);
            if let Some(target) = &self.target {
                operands.push(evaluate_recorded(target.as_ref(), ctx, activation).await);
            }
            for arg in &self.args {
                operands.push(evaluate_recorded(arg.as_ref(), ctx, activation).await);
            }

            if let Some(short_circuit) = propagate_strict(&operands) {
                return short_circuit;
            }

            let is_async = ctx.dispatcher.lookup(&self.overload_id).map(|ov| ov.is_async()).unwrap_or(false);
            if is_async {
                match ctx.async_calls.lookup_or_reserve(&self.overload_id, &operands) {
                    CallLookup::Resolved(v) => v,
                    CallLookup::New | CallLookup::Pending => Value::unknown(self.id),
                }
            } else {
                match ctx.dispatcher.invoke(&self.overload_id, &operands) {
                    Ok(v) => v,
                    Err(primary_err) => match self.receiver_dispatch(ctx, &operands) {
                        Some(v) => v,
                        None => Value::error(primary_err.to_string()),
                    },
                }
            }
        })
    }
}

impl CallNode {
    /// Retries a call bound to no implementation as a method on its first
    /// argument (spec §4.2 "if unbound, attempt a 'receiver' dispatch
    /// (method on arg0)"). The retry key is the original overload id
    /// prefixed with arg0's receiver type name (`"{type}_{overload_id}"`),
    /// so a host that wants `x.size()` to dispatch differently per
    /// receiver type registers e.g. `"string_size"`/`"list_size"` directly
    /// with the [`crate::dispatcher::Dispatcher`] without the planner
    /// needing to know about types at plan time. Returns `None` when there
    /// is no arg0 to dispatch on, or the receiver-qualified id is also
    /// unbound — the caller then surfaces the original error.
    fn receiver_dispatch(&self, ctx: &EvalContext, operands: &[Value]) -> Option<Value> {
        let receiver = operands.first()?;
        let receiver_overload_id = format!("{}_{}", receiver.type_name_for_receiver(), self.overload_id);
        ctx.dispatcher.invoke(&receiver_overload_id, operands).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::EmptyActivation;
    use crate::dispatcher::{DispatcherBuilder, Overload};
    use crate::interp::const_node::ConstNode;
    use crate::types::EmptyTypeRegistry;

    fn ctx(dispatcher: crate::dispatcher::Dispatcher) -> EvalContext {
        EvalContext::new(dispatcher, Arc::new(EmptyTypeRegistry))
    }

    #[tokio::test]
    async fn unbound_overload_retries_as_a_receiver_method() {
        // "size" has no bound implementation, but "string_size" does:
        // the call falls back to dispatching on arg0's receiver type.
        let dispatcher = DispatcherBuilder::new()
            .register("string_size", Overload::unary(|s| Ok(Value::Int(s.as_str().unwrap().len() as i64))))
            .build();
        let node = CallNode {
            id: 1,
            overload_id: "size".into(),
            target: None,
            args: vec![Arc::new(ConstNode { id: 2, value: Value::string("hello") })],
        };
        let c = ctx(dispatcher);
        let v = node.evaluate(&c, &EmptyActivation).await;
        assert_eq!(v.as_int(), Some(5));
    }

    #[tokio::test]
    async fn unbound_overload_with_no_receiver_match_surfaces_the_original_error() {
        let dispatcher = DispatcherBuilder::new().build();
        let node = CallNode {
            id: 1,
            overload_id: "size".into(),
            target: None,
            args: vec![Arc::new(ConstNode { id: 2, value: Value::string("hello") })],
        };
        let c = ctx(dispatcher);
        let v = node.evaluate(&c, &EmptyActivation).await;
        assert!(v.is_error());
    }
}
