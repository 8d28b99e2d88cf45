//! Overload dispatch (spec §4.5, §6).
//!
//! Generalizes the teacher's `fnc::run`/`fnc::synchronous` name-keyed
//! macro dispatch (`fnc/mod.rs`) into a registry keyed by a stable
//! overload id rather than a fixed, hardcoded function table — the core
//! does not ship a builtin library (spec §1 "Out of scope"), so overloads
//! must be registered by the host after the planner has already selected
//! an overload id per call site.

use crate::err::Error;
use crate::value::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type AsyncResult<'a> = Pin<Box<dyn Future<Output = Result<Value, Error>> + Send + 'a>>;

/// One concrete typed signature of a polymorphic function (spec
/// glossary: "Overload"). The `Async` variant is the seam described in
/// spec §4.4 / §6: a call site bound to it suspends the tree walk until
/// the host's future resolves, rather than ever blocking a worker thread.
#[derive(Clone)]
pub enum Overload {
    Zero(Arc<dyn Fn() -> Result<Value, Error> + Send + Sync>),
    Unary(Arc<dyn Fn(Value) -> Result<Value, Error> + Send + Sync>),
    Binary(Arc<dyn Fn(Value, Value) -> Result<Value, Error> + Send + Sync>),
    Variadic(Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>),
    Async(Arc<dyn for<'a> Fn(&'a [Value]) -> AsyncResult<'a> + Send + Sync>),
}

impl Overload {
    pub fn zero(f: impl Fn() -> Result<Value, Error> + Send + Sync + 'static) -> Self {
        Overload::Zero(Arc::new(f))
    }

    pub fn unary(f: impl Fn(Value) -> Result<Value, Error> + Send + Sync + 'static) -> Self {
        Overload::Unary(Arc::new(f))
    }

    pub fn binary(f: impl Fn(Value, Value) -> Result<Value, Error> + Send + Sync + 'static) -> Self {
        Overload::Binary(Arc::new(f))
    }

    pub fn variadic(f: impl Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static) -> Self {
        Overload::Variadic(Arc::new(f))
    }

    pub fn asynchronous(f: impl for<'a> Fn(&'a [Value]) -> AsyncResult<'a> + Send + Sync + 'static) -> Self {
        Overload::Async(Arc::new(f))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Overload::Async(_))
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, Error> {
        match (self, args) {
            (Overload::Zero(f), []) => f(),
            (Overload::Unary(f), [a]) => f(a.clone()),
            (Overload::Binary(f), [a, b]) => f(a.clone(), b.clone()),
            (Overload::Variadic(f), args) => f(args),
            (Overload::Async(_), _) => Err(Error::Unreachable("async overload invoked synchronously")),
            _ => Err(Error::Unreachable("overload arity mismatch")),
        }
    }

    pub fn invoke_async<'a>(&'a self, args: &'a [Value]) -> AsyncResult<'a> {
        match self {
            Overload::Async(f) => f(args),
            other => {
                let result = other.invoke(args);
                Box::pin(async move { result })
            }
        }
    }
}

/// Maps overload id → implementation. Dispatch is O(1) once the planner
/// has selected the overload id (spec §4.5).
#[derive(Clone, Default)]
pub struct Dispatcher {
    overloads: Arc<HashMap<String, Overload>>,
}

/// Mutable builder side of the dispatcher, kept separate from the
/// immutable [`Dispatcher`] used during evaluation so that registration
/// happens once up front and evaluation never takes a lock — mirroring
/// the teacher's `Context::freeze` immutability boundary.
#[derive(Default)]
pub struct DispatcherBuilder {
    overloads: HashMap<String, Overload>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, overload_id: impl Into<String>, implementation: Overload) -> Self {
        self.overloads.insert(overload_id.into(), implementation);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            overloads: Arc::new(self.overloads),
        }
    }
}

impl Dispatcher {
    pub fn lookup(&self, overload_id: &str) -> Option<&Overload> {
        self.overloads.get(overload_id)
    }

    /// Invokes `overload_id` with `args`, producing the "no such overload"
    /// error from spec §7 when nothing is bound.
    pub fn invoke(&self, overload_id: &str, args: &[Value]) -> Result<Value, Error> {
        match self.lookup(overload_id) {
            Some(ov) => ov.invoke(args),
            None => Err(Error::NoSuchOverload(overload_id.to_string())),
        }
    }

    pub async fn invoke_async(&self, overload_id: &str, args: &[Value]) -> Result<Value, Error> {
        match self.lookup(overload_id) {
            Some(ov) => ov.invoke_async(args).await,
            None => Err(Error::NoSuchOverload(overload_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_is_keyed_by_overload_id_not_name() {
        let dispatcher = DispatcherBuilder::new()
            .register("add_int_int", Overload::binary(|a, b| Ok(Value::Int(a.as_int().unwrap() + b.as_int().unwrap()))))
            .build();
        let result = dispatcher.invoke("add_int_int", &[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(result.as_int(), Some(3));
    }

    #[test]
    fn missing_overload_is_an_error() {
        let dispatcher = Dispatcher::default();
        let err = dispatcher.invoke("nope", &[]).unwrap_err();
        assert_eq!(err, Error::NoSuchOverload("nope".to_string()));
    }
}
