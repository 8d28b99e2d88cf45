//! The executable node tree (spec §4.1/§4.2) and the context threaded
//! through its evaluation.
//!
//! Every planned expression lowers to a tree of [`ExecutableNode`]s.
//! Evaluation is async because call nodes may bottom out in a host-supplied
//! async overload (spec §4.4), so the tree is walked with `dyn`-dispatched,
//! manually-boxed futures rather than `async fn` in a trait — trait objects
//! cannot return `impl Future` directly. Mirrors the shape of the teacher's
//! `fnc::run`, which splits a synchronous and an async dispatch path behind
//! one call site.

use crate::activation::Activation;
use crate::async_driver::AsyncCallRegistry;
use crate::dispatcher::Dispatcher;
use crate::err::Error;
use crate::state::EvalState;
use crate::types::TypeRegistry;
use crate::value::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Engine-wide collaborators for one evaluation, analogous to the
/// teacher's `ctx::Context` bundling a transaction, options and cancel
/// token. Cheap to clone (everything inside is `Arc`-backed) so each
/// nested call or comprehension iteration can carry its own handle.
#[derive(Clone)]
pub struct EvalContext {
    pub dispatcher: Dispatcher,
    pub registry: Arc<dyn TypeRegistry>,
    pub state: Arc<EvalState>,
    pub scope_pool: Arc<crate::activation::ScopePool>,
    pub async_calls: Arc<AsyncCallRegistry>,
    depth: Arc<AtomicU32>,
}

impl EvalContext {
    pub fn new(dispatcher: Dispatcher, registry: Arc<dyn TypeRegistry>) -> Self {
        EvalContext {
            dispatcher,
            registry,
            state: Arc::new(EvalState::new()),
            scope_pool: Arc::new(crate::activation::ScopePool::new()),
            async_calls: Arc::new(AsyncCallRegistry::new()),
            depth: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Enters one level of recursive evaluation, returning an error once
    /// `cnf::MAX_COMPUTATION_DEPTH` is exceeded rather than risking a stack
    /// overflow on a pathologically nested expression (spec §4.2 "Errors:
    /// ... computation depth"). The guard restores the counter on drop so
    /// sibling subtrees are not penalized by a deep cousin.
    pub fn enter(&self) -> Result<DepthGuard<'_>, Error> {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if depth > *crate::cnf::MAX_COMPUTATION_DEPTH {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::ComputationDepthExceeded);
        }
        Ok(DepthGuard {
            depth: &self.depth,
        })
    }
}

pub struct DepthGuard<'a> {
    depth: &'a AtomicU32,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One node of the planned, executable expression tree.
pub trait ExecutableNode: Send + Sync {
    /// The originating expression id, used for `EvalState` recording and
    /// `Unknown` id attribution (spec §3).
    fn id(&self) -> i64;

    fn evaluate<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Value>;
}

/// Folds a set of already-evaluated operands according to the strict
/// error/unknown propagation rule shared by every eager node kind (spec
/// §4.2): any `Unknown` operand wins and merges with every other unknown
/// present; otherwise the first `Error` wins. Returns `None` when every
/// operand is a normal value, i.e. evaluation should proceed.
pub fn propagate_strict(values: &[Value]) -> Option<Value> {
    if values.iter().any(Value::is_unknown) {
        let mut merged = values.iter().find(|v| v.is_unknown()).cloned().unwrap();
        for v in values.iter().filter(|v| v.is_unknown()) {
            merged = Value::merge_unknown(merged, v.clone());
        }
        return Some(merged);
    }
    values.iter().find(|v| v.is_error()).cloned()
}

/// Runs `node` to depth-checked completion and records the result in
/// `ctx.state`, as every node kind's evaluate must (spec §3 "every node
/// records its own result"). Node implementations call this instead of
/// duplicating the depth-guard/record boilerplate.
pub async fn evaluate_recorded<'a>(node: &'a dyn ExecutableNode, ctx: &'a EvalContext, activation: &'a dyn Activation) -> Value {
    let _guard = match ctx.enter() {
        Ok(guard) => guard,
        Err(e) => {
            let v = Value::error(e.to_string());
            ctx.state.record(node.id(), &v);
            return v;
        }
    };
    let value = node.evaluate(ctx, activation).await;
    ctx.state.record(node.id(), &value);
    value
}
