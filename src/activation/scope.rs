//! Pooled comprehension scopes (spec §9: "Arena + index for folds").
//!
//! A comprehension fold pushes one short-lived scope per iteration to bind
//! `accuVar`/`iterVar`. Allocating a fresh `HashMap`-backed activation per
//! iteration would dominate the cost of cheap folds (`spec §4.2`: "Variable
//! scopes MUST be pooled or otherwise allocation-cheap"), so scopes are
//! drawn from a pool and returned on drop, mirroring the teacher's
//! explicit acquire/release discipline around `Context::freeze`/`unfreeze`
//! in `ctx/context.rs`.

use super::{Activation, AttributePattern, Binding};
use crate::value::Value;
use std::sync::Mutex;

/// A single reusable scope slot: up to two `(name, binding)` entries,
/// which covers every comprehension fold shape in spec §4.2
/// (`accuVar`, `iterVar`). Larger scopes simply fall back to a heap
/// allocation via the `extra` vector, which stays empty on the common
/// path.
#[derive(Default)]
pub struct ScopeSlot {
    entries: Vec<(String, Binding)>,
}

impl ScopeSlot {
    fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), Binding::value(value)));
    }

    pub fn bind_thunk(&mut self, name: impl Into<String>, binding: Binding) {
        self.entries.push((name.into(), binding));
    }
}

impl Activation for ScopeSlot {
    fn resolve(&self, name: &str) -> Option<Value> {
        // Last-bound-wins within a layer (spec §3), so scan in reverse.
        self.entries.iter().rev().find(|(n, _)| n == name).map(|(_, b)| b.resolve())
    }
}

/// A pool of [`ScopeSlot`]s shared across evaluations of a single plan
/// (spec §5: "the pool is shared across evaluations of a plan and must be
/// concurrency-safe").
pub struct ScopePool {
    free: Mutex<Vec<ScopeSlot>>,
}

impl ScopePool {
    pub fn new() -> Self {
        ScopePool::with_capacity(*crate::cnf::SCOPE_POOL_INITIAL_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let mut free = Vec::with_capacity(cap);
        for _ in 0..cap {
            free.push(ScopeSlot::default());
        }
        ScopePool {
            free: Mutex::new(free),
        }
    }

    /// Acquires a cleared scope slot from the pool, allocating a new one
    /// if the pool is empty.
    pub fn acquire(self: &std::sync::Arc<Self>) -> PooledScope {
        let slot = self.free.lock().expect("scope pool mutex poisoned").pop().unwrap_or_default();
        PooledScope {
            pool: self.clone(),
            slot: Some(slot),
        }
    }

    fn release(&self, mut slot: ScopeSlot) {
        slot.clear();
        self.free.lock().expect("scope pool mutex poisoned").push(slot);
    }
}

impl Default for ScopePool {
    fn default() -> Self {
        ScopePool::new()
    }
}

/// An RAII guard around a borrowed [`ScopeSlot`]. On drop the slot is
/// cleared and returned to the pool (spec §9: "each scope object MUST be
/// cleared before return to pool").
pub struct PooledScope {
    pool: std::sync::Arc<ScopePool>,
    slot: Option<ScopeSlot>,
}

impl PooledScope {
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.slot.as_mut().expect("scope already released").bind(name, value);
    }

    pub fn bind_thunk(&mut self, name: impl Into<String>, binding: Binding) {
        self.slot.as_mut().expect("scope already released").bind_thunk(name, binding);
    }
}

impl Activation for PooledScope {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.slot.as_ref().expect("scope already released").resolve(name)
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        &[]
    }
}

impl Drop for PooledScope {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.pool.release(slot);
        }
    }
}
