//! The generic comprehension fold (spec §4.2 "Comprehension fold"), the
//! evaluation shape every CEL macro (`exists`, `all`, `map`, `filter`, ...)
//! desugars to above this crate. Per spec §9 "Arena + index for folds",
//! each iteration's `iterVar` binding comes from the pooled scope
//! ([`crate::activation::ScopePool`]) rather than a fresh allocation.

use crate::activation::{Activation, Chained};
use crate::err::Error;
use crate::node::{evaluate_recorded, BoxFuture, EvalContext, ExecutableNode};
use crate::value::{Iterable, Value};
use std::sync::{Arc, RwLock};

/// A single mutable `(name -> value)` binding, used for the fold's
/// accumulator. Unlike the per-iteration `iterVar` scope this is rebound
/// (not re-pushed) across iterations, since there is exactly one
/// accumulator per comprehension rather than one per element.
struct AccuBinding {
    name: String,
    value: RwLock<Value>,
}

impl AccuBinding {
    fn new(name: String, value: Value) -> Self {
        AccuBinding {
            name,
            value: RwLock::new(value),
        }
    }

    fn set(&self, value: Value) {
        *self.value.write().expect("accu binding lock poisoned") = value;
    }

    fn get(&self) -> Value {
        self.value.read().expect("accu binding lock poisoned").clone()
    }
}

impl Activation for AccuBinding {
    fn resolve(&self, name: &str) -> Option<Value> {
        if name == self.name {
            Some(self.get())
        } else {
            None
        }
    }
}

pub struct ComprehensionNode {
    pub id: i64,
    pub iter_range: Arc<dyn ExecutableNode>,
    pub iter_var: String,
    pub accu_var: String,
    pub accu_init: Arc<dyn ExecutableNode>,
    pub loop_condition: Arc<dyn ExecutableNode>,
    pub loop_step: Arc<dyn ExecutableNode>,
    pub result: Arc<dyn ExecutableNode>,
    /// Set by the Exhaustive decorator (spec §4.1): the fold always runs
    /// every iteration to completion, ignoring `loopCondition`'s early-exit
    /// signal, so observers see every iteration's subexpressions.
    pub exhaustive: bool,
}

impl ExecutableNode for ComprehensionNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let range = evaluate_recorded(self.iter_range.as_ref(), ctx, activation).await;
            if range.is_error_or_unknown() {
                return range;
            }
            if !range.is_iterable() {
                return Value::error(Error::NotIterable(range.type_name().to_string()).to_string());
            }

            let accu_init = evaluate_recorded(self.accu_init.as_ref(), ctx, activation).await;
            if accu_init.is_error_or_unknown() {
                return accu_init;
            }
            let accu = AccuBinding::new(self.accu_var.clone(), accu_init);
            let accu_activation = Chained::new(activation, &accu);

            for item in range.iter_values() {
                let mut iter_scope = ctx.scope_pool.acquire();
                iter_scope.bind(self.iter_var.clone(), item);
                let inner = Chained::new(&accu_activation, &iter_scope);

                if self.exhaustive {
                    // Evaluated for observation only; its value never gates
                    // the loop (spec §4.1 "Exhaustive ... ignores the
                    // early-termination condition").
                    let _ = evaluate_recorded(self.loop_condition.as_ref(), ctx, &inner).await;
                } else {
                    let cond = evaluate_recorded(self.loop_condition.as_ref(), ctx, &inner).await;
                    if matches!(cond, Value::Bool(false)) {
                        break;
                    }
                    if cond.is_error() {
                        return cond;
                    }
                }

                let next = evaluate_recorded(self.loop_step.as_ref(), ctx, &inner).await;
                if next.is_error_or_unknown() {
                    return next;
                }
                accu.set(next);
            }

            evaluate_recorded(self.result.as_ref(), ctx, &accu_activation).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::EmptyActivation;
    use crate::dispatcher::{Dispatcher, DispatcherBuilder, Overload};
    use crate::interp::const_node::ConstNode;
    use crate::types::EmptyTypeRegistry;
    use crate::value::Value;

    fn dispatcher() -> Dispatcher {
        DispatcherBuilder::new()
            .register("modulo", Overload::binary(|a, b| Ok(Value::Int(a.as_int().unwrap() % b.as_int().unwrap()))))
            .register("logical_or", Overload::binary(|a, b| Ok(Value::Bool(a.is_truthy() || b.is_truthy()))))
            .register(
                "equals_int",
                Overload::binary(|a, b| Ok(Value::Bool(a.as_int() == b.as_int()))),
            )
            .build()
    }

    fn ctx() -> EvalContext {
        EvalContext::new(dispatcher(), Arc::new(EmptyTypeRegistry))
    }

    /// `[2, 4, 6].exists(x, x % 2 == 0)` (spec §8 scenario) -> `true`,
    /// built directly from node primitives rather than through the planner.
    #[tokio::test]
    async fn exists_over_list_finds_match() {
        use crate::interp::call::CallNode;
        use crate::interp::logical::{LogicalNode, LogicalOp};

        let range: Arc<dyn ExecutableNode> = Arc::new(crate::interp::create_list::CreateListNode {
            id: 1,
            elements: vec![
                Arc::new(ConstNode { id: 2, value: Value::Int(2) }),
                Arc::new(ConstNode { id: 3, value: Value::Int(4) }),
                Arc::new(ConstNode { id: 4, value: Value::Int(6) }),
            ],
        });

        let x_mod_2: Arc<dyn ExecutableNode> = Arc::new(CallNode {
            id: 10,
            overload_id: "modulo".into(),
            target: None,
            args: vec![
                Arc::new(IdentNode("x".into())),
                Arc::new(ConstNode { id: 11, value: Value::Int(2) }),
            ],
        });
        let step_cond: Arc<dyn ExecutableNode> = Arc::new(CallNode {
            id: 12,
            overload_id: "equals_int".into(),
            target: None,
            args: vec![x_mod_2, Arc::new(ConstNode { id: 13, value: Value::Int(0) })],
        });

        let loop_condition: Arc<dyn ExecutableNode> = Arc::new(NotAccuNode(self_accu_var()));

        let step: Arc<dyn ExecutableNode> = Arc::new(LogicalNode {
            id: 15,
            op: LogicalOp::Or,
            lhs: Arc::new(IdentNode(self_accu_var())),
            rhs: step_cond,
            exhaustive: false,
        });

        let comprehension = ComprehensionNode {
            id: 100,
            iter_range: range,
            iter_var: "x".into(),
            accu_var: self_accu_var(),
            accu_init: Arc::new(ConstNode { id: 20, value: Value::Bool(false) }),
            loop_condition,
            loop_step: step,
            result: Arc::new(IdentNode(self_accu_var())),
            exhaustive: false,
        };

        let c = ctx();
        let v = comprehension.evaluate(&c, &EmptyActivation).await;
        assert_eq!(v.as_bool(), Some(true));
    }

    fn self_accu_var() -> String {
        "__accu__".to_string()
    }

    struct IdentNode(String);
    impl ExecutableNode for IdentNode {
        fn id(&self) -> i64 {
            0
        }
        fn evaluate<'a>(&'a self, _ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
            let name = self.0.clone();
            Box::pin(async move { activation.resolve(&name).unwrap_or_else(|| Value::error(format!("no such attribute: {name}"))) })
        }
    }

    struct NotAccuNode(String);
    impl ExecutableNode for NotAccuNode {
        fn id(&self) -> i64 {
            0
        }
        fn evaluate<'a>(&'a self, _ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value> {
            let name = self.0.clone();
            Box::pin(async move {
                match activation.resolve(&name) {
                    Some(Value::Bool(b)) => Value::Bool(!b),
                    _ => Value::error("accu is not a bool"),
                }
            })
        }
    }
}
