//! Literal evaluation (spec §4.2 "Const").

use crate::activation::Activation;
use crate::node::{BoxFuture, EvalContext, ExecutableNode};
use crate::value::Value;

pub struct ConstNode {
    pub id: i64,
    pub value: Value,
}

impl ExecutableNode for ConstNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, _ctx: &'a EvalContext, _activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        let value = self.value.clone();
        Box::pin(async move { value })
    }
}
