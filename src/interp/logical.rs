//! `&&` / `||` evaluation, strict and exhaustive (spec §4.2 "LogicalAnd/Or").

use crate::activation::Activation;
use crate::node::{evaluate_recorded, BoxFuture, EvalContext, ExecutableNode};
use crate::value::Value;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Applies the absorbing combination rule: a `False` always wins an `And`
/// and a `True` always wins an `Or`, even against an `Error`/`Unknown` on
/// the other side (spec §8: `false && 1/0 != 0` evaluates to `false`).
fn combine(op: LogicalOp, lhs: &Value, rhs: &Value) -> Value {
    let absorbing = match op {
        LogicalOp::And => Value::Bool(false),
        LogicalOp::Or => Value::Bool(true),
    };
    let is_absorbing = |v: &Value| matches!((op, v), (LogicalOp::And, Value::Bool(false)) | (LogicalOp::Or, Value::Bool(true)));
    if is_absorbing(lhs) || is_absorbing(rhs) {
        return absorbing;
    }
    if lhs.is_error_or_unknown() || rhs.is_error_or_unknown() {
        return Value::merge_unknown(lhs.clone(), rhs.clone());
    }
    match op {
        LogicalOp::And => Value::Bool(lhs.is_truthy() && rhs.is_truthy()),
        LogicalOp::Or => Value::Bool(lhs.is_truthy() || rhs.is_truthy()),
    }
}

pub struct LogicalNode {
    pub id: i64,
    pub op: LogicalOp,
    pub lhs: Arc<dyn ExecutableNode>,
    pub rhs: Arc<dyn ExecutableNode>,
    /// Set by the Exhaustive decorator (spec §4.1): forces both operands
    /// to be evaluated even when the left alone already decides the
    /// result, so `EvalState`/`Observe` see a value recorded at every id.
    pub exhaustive: bool,
}

impl ExecutableNode for LogicalNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let lhs = evaluate_recorded(self.lhs.as_ref(), ctx, activation).await;

            if !self.exhaustive {
                let short_circuits = match self.op {
                    LogicalOp::And => matches!(lhs, Value::Bool(false)),
                    LogicalOp::Or => matches!(lhs, Value::Bool(true)),
                };
                if short_circuits {
                    return lhs;
                }
            }

            let rhs = evaluate_recorded(self.rhs.as_ref(), ctx, activation).await;
            combine(self.op, &lhs, &rhs)
        })
    }
}
