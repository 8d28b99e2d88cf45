//! `cond ? truthy : falsy` evaluation, strict and exhaustive (spec §4.2
//! "Conditional").

use crate::activation::Activation;
use crate::node::{evaluate_recorded, BoxFuture, EvalContext, ExecutableNode};
use crate::value::Value;
use std::sync::Arc;

pub struct ConditionalNode {
    pub id: i64,
    pub cond: Arc<dyn ExecutableNode>,
    pub truthy: Arc<dyn ExecutableNode>,
    pub falsy: Arc<dyn ExecutableNode>,
    pub exhaustive: bool,
}

impl ExecutableNode for ConditionalNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let cond = evaluate_recorded(self.cond.as_ref(), ctx, activation).await;

            if self.exhaustive {
                let truthy = evaluate_recorded(self.truthy.as_ref(), ctx, activation).await;
                let falsy = evaluate_recorded(self.falsy.as_ref(), ctx, activation).await;
                return match cond {
                    Value::Bool(true) => truthy,
                    Value::Bool(false) => falsy,
                    other if other.is_error_or_unknown() => other,
                    other => Value::error(crate::err::Error::type_mismatch("bool", other.type_name()).to_string()),
                };
            }

            match cond {
                Value::Bool(true) => evaluate_recorded(self.truthy.as_ref(), ctx, activation).await,
                Value::Bool(false) => evaluate_recorded(self.falsy.as_ref(), ctx, activation).await,
                other if other.is_error_or_unknown() => other,
                other => Value::error(crate::err::Error::type_mismatch("bool", other.type_name()).to_string()),
            }
        })
    }
}
