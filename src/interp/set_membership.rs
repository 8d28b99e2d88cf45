//! `SetMembership` (spec §4.2): the Optimize decorator's specialization of
//! `element in [constant, ...]` when the list is constant and homogeneous
//! over one of the hashable primitive qualifier types. Backed by the same
//! [`MapKey`] enum the attribute resolver uses for map keys, since both
//! need exactly "string | int | uint | bool" equality-by-value-and-type.

use crate::activation::Activation;
use crate::node::{evaluate_recorded, BoxFuture, EvalContext, ExecutableNode};
use crate::value::{MapKey, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub struct SetMembershipNode {
    pub id: i64,
    pub element: Arc<dyn ExecutableNode>,
    /// The runtime type name every set member shares; a mismatching
    /// element's runtime type is an `Error`, never a `false` (spec §4.2
    /// "SetMembership").
    pub member_type_name: &'static str,
    pub set: Arc<HashSet<MapKey>>,
}

impl ExecutableNode for SetMembershipNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let element = evaluate_recorded(self.element.as_ref(), ctx, activation).await;
            if element.is_error_or_unknown() {
                return element;
            }
            if element.type_name() != self.member_type_name {
                return Value::error(format!("no such overload: in({}, list({}))", element.type_name(), self.member_type_name));
            }
            match MapKey::try_from(&element) {
                Ok(key) => Value::Bool(self.set.contains(&key)),
                Err(e) => Value::error_value(e),
            }
        })
    }
}
