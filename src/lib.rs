//! Runtime core for a CEL-style expression interpreter (spec §1-§2):
//! the value model, activations (including partial activations over
//! unknown attributes), attribute/qualifier resolution, the executable
//! node planner with its decorator pipeline, the overload dispatcher, and
//! the asynchronous re-evaluation driver.
//!
//! Lexing, parsing, type checking, the builtin function library and a
//! bytecode/JIT backend are all out of scope (spec §1) — a host builds a
//! [`planner::Expr`] tree directly (after its own parse/typecheck pass),
//! lowers it once with [`planner::Planner::plan`], and evaluates the
//! resulting tree with [`evaluate`] or [`evaluate_async`] as many times as
//! it likes against different activations (spec §5 "Lifecycles": a plan
//! outlives any one evaluation, while an [`node::EvalContext`] belongs to
//! exactly one).

pub mod activation;
pub mod async_driver;
pub mod attribute;
pub mod cnf;
pub mod dispatcher;
pub mod err;
pub mod interp;
pub mod node;
pub mod planner;
pub mod state;
pub mod types;
pub mod value;

use crate::activation::Activation;
use crate::node::{evaluate_recorded, EvalContext, ExecutableNode};
use crate::value::Value;

/// The synchronous driver entry point (spec §6 "`evaluate(activation) →
/// value`"). Any call site bound to an async overload reports `Unknown`
/// for its subtree rather than ever being awaited — use
/// [`evaluate_async`] when the host wants those calls actually fired and
/// the tree re-walked to a fixed point.
pub async fn evaluate(ctx: &EvalContext, root: &dyn ExecutableNode, activation: &dyn Activation) -> Value {
    evaluate_recorded(root, ctx, activation).await
}

/// The async driver entry point (spec §6 "`evaluateAsync(context,
/// partialActivation) → value`", spec §4.4): fires pending async calls and
/// re-walks `root` until no new call is discovered (fixed point) or
/// `cnf::MAX_ASYNC_PASSES` trips. `activation` is typically a
/// [`activation::PartialActivation`] when the host is probing which
/// attributes are still missing, but any `Activation` is accepted.
pub async fn evaluate_async(ctx: &EvalContext, root: &dyn ExecutableNode, activation: &dyn Activation) -> Value {
    crate::async_driver::run_to_fixed_point(root, ctx, activation).await
}
