//! The asynchronous re-evaluation driver (spec §4.4).
//!
//! A call site bound to an [`crate::dispatcher::Overload::Async`] overload
//! cannot be resolved inline: the first pass over the tree that reaches it
//! reserves the call (recording its overload id and arguments) and
//! surfaces `Unknown` for that subtree so the rest of the (side-effect-free)
//! tree still evaluates as far as it can in the same pass. Once the pass
//! completes, the driver fires every newly-reserved call concurrently,
//! records each result, and re-evaluates the whole tree again. This
//! repeats until a pass produces no new pending calls (fixed point) or the
//! `cnf::MAX_ASYNC_PASSES` safety valve trips.
//!
//! Calls are keyed by `(overload id, argument vector)` so that the same
//! logical call issued twice with the same arguments is only ever invoked
//! once (spec §4.4 "at-most-once invocation per unique call"), mirroring
//! the teacher's `fnc::run` dispatch shape generalized to be memoizing and
//! suspendable. Spec §4.4 is explicit that this sharing crosses call
//! sites: "multiple textual occurrences that share the same overload id
//! share a single record" — the call site's own expression id plays no
//! part in the key, only the overload id being invoked and the arguments
//! it is invoked with.

use crate::activation::Activation;
use crate::node::{evaluate_recorded, EvalContext, ExecutableNode};
use crate::value::Value;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};

fn args_key(args: &[Value]) -> String {
    format!("{args:?}")
}

/// `(overload id, argument vector key)`.
type CallKey = (String, String);

#[derive(Clone)]
enum CallState {
    Pending { args: Vec<Value> },
    Resolved(Value),
}

/// What a call site observes when it asks the registry about a call it is
/// about to make.
pub enum CallLookup {
    /// This exact `(overload id, args)` pair has never been seen and has
    /// just been reserved; the driver will fire it after this pass.
    New,
    /// Already reserved from this or an earlier pass; not resolved yet.
    Pending,
    /// Already resolved; the call site can use this value directly without
    /// suspending again.
    Resolved(Value),
}

/// Tracks in-flight and completed async calls across re-evaluation passes
/// of a single plan execution.
#[derive(Default)]
pub struct AsyncCallRegistry {
    calls: DashMap<CallKey, CallState>,
    resolved_count: AtomicU64,
}

impl AsyncCallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up, or reserves, the call bound to `overload_id` invoked with
    /// `args`. A concurrent re-entrant lookup for the same key within a
    /// pass sees `Pending` rather than double-reserving; two different
    /// call sites bound to the same `overload_id` with equal `args` share
    /// this one record (spec §4.4 "share a single record").
    pub fn lookup_or_reserve(&self, overload_id: &str, args: &[Value]) -> CallLookup {
        let key = (overload_id.to_string(), args_key(args));
        match self.calls.get(&key).map(|entry| entry.clone()) {
            Some(CallState::Resolved(v)) => CallLookup::Resolved(v),
            Some(CallState::Pending { .. }) => CallLookup::Pending,
            None => {
                self.calls.insert(key, CallState::Pending { args: args.to_vec() });
                CallLookup::New
            }
        }
    }

    fn resolve(&self, key: CallKey, result: Value) {
        self.calls.insert(key, CallState::Resolved(result));
        self.resolved_count.fetch_add(1, Ordering::SeqCst);
    }

    fn pending_entries(&self) -> Vec<(CallKey, Vec<Value>)> {
        self.calls
            .iter()
            .filter_map(|entry| match entry.value() {
                CallState::Pending { args } => Some((entry.key().clone(), args.clone())),
                CallState::Resolved(_) => None,
            })
            .collect()
    }

    fn has_pending(&self) -> bool {
        self.calls.iter().any(|entry| matches!(entry.value(), CallState::Pending { .. }))
    }
}

/// Drives `root` to a fixed point, firing async calls as they are
/// discovered. Returns the final value, which is only `Unknown` on calls
/// that genuinely never resolve within `cnf::MAX_ASYNC_PASSES` passes.
pub async fn run_to_fixed_point(root: &dyn ExecutableNode, ctx: &EvalContext, activation: &dyn Activation) -> Value {
    let mut passes = 0u32;
    loop {
        passes += 1;
        let result = evaluate_recorded(root, ctx, activation).await;
        if !ctx.async_calls.has_pending() {
            return result;
        }
        if passes >= *crate::cnf::MAX_ASYNC_PASSES {
            tracing::warn!(passes, "async driver exceeded max passes, returning last value");
            return result;
        }

        let pending = ctx.async_calls.pending_entries();
        tracing::debug!(passes, pending = pending.len(), "async driver pass complete, firing pending calls");
        let dispatcher = ctx.dispatcher.clone();
        let fired = join_all(pending.into_iter().map(|(key, args)| {
            let dispatcher = dispatcher.clone();
            async move {
                let overload_id = key.0.clone();
                let outcome = dispatcher.invoke_async(&overload_id, &args).await;
                let value = match outcome {
                    Ok(v) => v,
                    Err(e) => Value::error(e.to_string()),
                };
                (key, value)
            }
        }))
        .await;
        for (key, value) in fired {
            ctx.async_calls.resolve(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_call_with_same_args_is_memoized() {
        let registry = AsyncCallRegistry::new();
        let args = vec![Value::Int(1)];
        assert!(matches!(registry.lookup_or_reserve("echo", &args), CallLookup::New));
        assert!(matches!(registry.lookup_or_reserve("echo", &args), CallLookup::Pending));
        let key = ("echo".to_string(), args_key(&args));
        registry.resolve(key, Value::Int(42));
        match registry.lookup_or_reserve("echo", &args) {
            CallLookup::Resolved(v) => assert_eq!(v.as_int(), Some(42)),
            _ => panic!("expected resolved call to be memoized"),
        }
    }

    #[test]
    fn distinct_args_are_distinct_calls() {
        let registry = AsyncCallRegistry::new();
        let key = ("echo".to_string(), args_key(&[Value::Int(1)]));
        registry.resolve(key, Value::Int(100));
        assert!(matches!(registry.lookup_or_reserve("echo", &[Value::Int(2)]), CallLookup::New));
    }

    #[test]
    fn distinct_overloads_with_identical_args_are_distinct_calls() {
        // Same args, different overload id: must not collide (spec §4.4
        // keys on `(overload id, args)`, not args alone).
        let registry = AsyncCallRegistry::new();
        let args = vec![Value::Int(1)];
        registry.resolve(("echo".to_string(), args_key(&args)), Value::Int(1));
        assert!(matches!(registry.lookup_or_reserve("double", &args), CallLookup::New));
    }

    #[test]
    fn same_overload_and_args_from_different_call_sites_share_one_record() {
        // The call site's own expression id plays no part in the key
        // (spec §4.4 "share a single record" across textual occurrences).
        let registry = AsyncCallRegistry::new();
        let args = vec![Value::Int(7)];
        assert!(matches!(registry.lookup_or_reserve("echo", &args), CallLookup::New));
        // A second "call site" making the identical call sees Pending, not
        // New, since nothing about the key distinguishes call sites.
        assert!(matches!(registry.lookup_or_reserve("echo", &args), CallLookup::Pending));
    }
}
