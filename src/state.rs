//! Evaluation state: a dense map from expression id to the last computed
//! value at that id (spec §3 `EvalState`).
//!
//! Required by the Observe decorator and by the async driver, which must
//! inspect which expression ids an `Unknown` result came from. Owned by a
//! single evaluation (spec §3 "Lifecycles"), so interior mutability is
//! enough — no cross-evaluation sharing is ever needed.

use crate::value::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct EvalState {
    values: Mutex<HashMap<i64, Value>>,
}

impl EvalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the value computed at `id`, overwriting any prior entry —
    /// re-evaluation (e.g. across async driver passes) always reflects
    /// the most recent pass.
    pub fn record(&self, id: i64, value: &Value) {
        self.values.lock().expect("eval state mutex poisoned").insert(id, value.clone());
    }

    pub fn get(&self, id: i64) -> Option<Value> {
        self.values.lock().expect("eval state mutex poisoned").get(&id).cloned()
    }

    pub fn snapshot(&self) -> HashMap<i64, Value> {
        self.values.lock().expect("eval state mutex poisoned").clone()
    }
}
