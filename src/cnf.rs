//! Runtime tunables, read from the environment with sane defaults.
//!
//! Mirrors the teacher's `cnf.rs` convention of a flat module of
//! `once_cell::sync::Lazy` statics read once and cached for the process
//! lifetime.

use once_cell::sync::Lazy;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Maximum nesting depth for attribute qualification and comprehension
/// recursion. Protects the recursive `async_recursion` call chains from
/// unbounded stack growth on pathological or cyclic plans.
pub static MAX_COMPUTATION_DEPTH: Lazy<u32> =
    Lazy::new(|| env_or("CEL_MAX_COMPUTATION_DEPTH", 128));

/// Safety-valve cap on the number of passes the async driver will run
/// before giving up and returning the last Unknown, even if individual
/// async calls keep reporting progress. Guards against a misbehaving
/// async implementation that never converges.
pub static MAX_ASYNC_PASSES: Lazy<u32> = Lazy::new(|| env_or("CEL_MAX_ASYNC_PASSES", 10_000));

/// Initial capacity of the comprehension scope pool.
pub static SCOPE_POOL_INITIAL_CAPACITY: Lazy<usize> =
    Lazy::new(|| env_or("CEL_SCOPE_POOL_CAPACITY", 16));
