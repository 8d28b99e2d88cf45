//! Identifier / attribute evaluation (spec §4.2 "Identifier / Attribute").

use crate::activation::Activation;
use crate::attribute::Attribute;
use crate::node::{BoxFuture, EvalContext, ExecutableNode};
use crate::value::Value;

pub struct AttributeNode {
    pub attribute: Attribute,
}

impl ExecutableNode for AttributeNode {
    fn id(&self) -> i64 {
        self.attribute.id()
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        self.attribute.resolve(ctx, activation)
    }
}
