//! `has(operand.field)` (spec §4.2 "FieldExistsTest").

use crate::activation::Activation;
use crate::err::Error;
use crate::node::{evaluate_recorded, BoxFuture, EvalContext, ExecutableNode};
use crate::value::{FieldTester, Value};
use std::sync::Arc;

pub struct FieldExistsNode {
    pub id: i64,
    pub operand: Arc<dyn ExecutableNode>,
    pub field: String,
}

impl ExecutableNode for FieldExistsNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let v = evaluate_recorded(self.operand.as_ref(), ctx, activation).await;
            match v {
                Value::Object(ref o) => match o.is_set_metadata(&self.field) {
                    Some(is_set) => Value::Bool(is_set),
                    None => Value::Bool(o.get(&self.field).is_some()),
                },
                Value::Map(_) => Value::Bool(v.has_field(&self.field)),
                other if other.is_error_or_unknown() => other,
                other => Value::error(Error::type_mismatch("object or map", other.type_name()).to_string()),
            }
        })
    }
}
