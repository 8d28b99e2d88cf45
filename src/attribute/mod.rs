//! Attributes: the planner's representation of a qualified variable access
//! (spec §3/§4.3), generalizing the teacher's `sql::Idiom`/`Part` chain
//! (`sql/part.rs`, `sql/value/get.rs`) from a single concrete AST shape
//! into the five variants CEL's planner actually needs depending on how
//! much is known statically about the root.

mod qualifier;

pub use qualifier::Qualifier;

use crate::activation::{Activation, AttributePattern, QualifierValue};
use crate::err::Error;
use crate::node::{evaluate_recorded, EvalContext, ExecutableNode};
use crate::value::Value;
use async_recursion::async_recursion;
use std::sync::Arc;

/// A variable access together with the chain of qualifiers applied to it.
///
/// `id` always tracks the *outermost* expression this attribute currently
/// represents — the planner updates it each time a further `Select`/`Index`
/// collapses onto an existing attribute (spec §4.1 "chained Select/Index
/// collapse into a single absolute attribute where possible"), since the
/// resulting `AttributeNode` stands in for that whole subexpression in
/// `EvalState`. `qualifier_ids` runs parallel to `qualifiers`, recording the
/// expression id each individual step originated from, so partial-activation
/// matching can attribute an `Unknown` to "the deepest qualifier that still
/// lies within the pattern's prefix" (spec §4.3) rather than only ever the
/// attribute's own id.
pub enum Attribute {
    /// A single, statically-known fully-qualified name (spec §4.1:
    /// "checked identifiers lower to Absolute attributes").
    Absolute {
        id: i64,
        name: String,
        qualifiers: Vec<Qualifier>,
        qualifier_ids: Vec<i64>,
    },
    /// An unqualified identifier whose namespace candidates are expanded
    /// lazily, in priority order, at resolution time via
    /// `TypeRegistry::resolve_candidate_names` (spec §3 "Maybe").
    Maybe {
        id: i64,
        name: String,
        qualifiers: Vec<Qualifier>,
        qualifier_ids: Vec<i64>,
    },
    /// Qualifiers applied to the result of an arbitrary subexpression,
    /// e.g. `f(x).field` (spec §3 "Relative").
    Relative {
        id: i64,
        operand: Arc<dyn ExecutableNode>,
        qualifiers: Vec<Qualifier>,
        qualifier_ids: Vec<i64>,
    },
    /// `(cond ? a : b).field`: which branch's attribute to qualify is
    /// itself only known once `cond` is evaluated (spec §3 "Conditional").
    /// Any qualifier trailing the ternary (e.g. the `.field` above) is
    /// pushed onto *both* `truthy` and `falsy` by the planner rather than
    /// held here, so each branch's own pattern matching still applies.
    Conditional {
        id: i64,
        cond: Arc<dyn ExecutableNode>,
        truthy: Box<Attribute>,
        falsy: Box<Attribute>,
    },
    /// A statically fixed list of alternative full attribute paths, tried
    /// in order, used when the planner cannot tell at plan time whether a
    /// select chain is a package-qualified name or a field access (spec §3
    /// "OneOf").
    OneOf {
        id: i64,
        candidates: Vec<String>,
        qualifiers: Vec<Qualifier>,
        qualifier_ids: Vec<i64>,
    },
}

impl Attribute {
    pub fn absolute(id: i64, name: impl Into<String>) -> Self {
        Attribute::Absolute {
            id,
            name: name.into(),
            qualifiers: Vec::new(),
            qualifier_ids: Vec::new(),
        }
    }

    pub fn maybe(id: i64, name: impl Into<String>) -> Self {
        Attribute::Maybe {
            id,
            name: name.into(),
            qualifiers: Vec::new(),
            qualifier_ids: Vec::new(),
        }
    }

    pub fn relative(id: i64, operand: Arc<dyn ExecutableNode>) -> Self {
        Attribute::Relative {
            id,
            operand,
            qualifiers: Vec::new(),
            qualifier_ids: Vec::new(),
        }
    }

    pub fn one_of(id: i64, candidates: Vec<String>) -> Self {
        Attribute::OneOf {
            id,
            candidates,
            qualifiers: Vec::new(),
            qualifier_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Attribute::Absolute { id, .. }
            | Attribute::Maybe { id, .. }
            | Attribute::Relative { id, .. }
            | Attribute::Conditional { id, .. }
            | Attribute::OneOf { id, .. } => *id,
        }
    }

    /// Appends one qualifier originating from expression `id`, and moves the
    /// attribute's own `id` forward to match (the planner always calls this
    /// with the id of the enclosing `Select`/`Index` it just collapsed).
    /// `Conditional` has no qualifier chain of its own, so a qualifier
    /// trailing a ternary (`(cond ? a : b).field`) is pushed onto both
    /// `truthy` and `falsy` instead, each of which applies its own pattern
    /// matching independently.
    pub fn push_qualifier(&mut self, id: i64, qualifier: Qualifier) {
        match self {
            Attribute::Absolute { id: top, qualifiers, qualifier_ids, .. }
            | Attribute::Maybe { id: top, qualifiers, qualifier_ids, .. }
            | Attribute::Relative { id: top, qualifiers, qualifier_ids, .. }
            | Attribute::OneOf { id: top, qualifiers, qualifier_ids, .. } => {
                qualifiers.push(qualifier);
                qualifier_ids.push(id);
                *top = id;
            }
            Attribute::Conditional { id: top, truthy, falsy, .. } => {
                truthy.push_qualifier(id, qualifier.clone());
                falsy.push_qualifier(id, qualifier);
                *top = id;
            }
        }
    }

    fn qualifiers(&self) -> &[Qualifier] {
        match self {
            Attribute::Absolute { qualifiers, .. }
            | Attribute::Maybe { qualifiers, .. }
            | Attribute::Relative { qualifiers, .. }
            | Attribute::OneOf { qualifiers, .. } => qualifiers,
            Attribute::Conditional { .. } => &[],
        }
    }

    fn qualifier_ids(&self) -> &[i64] {
        match self {
            Attribute::Absolute { qualifier_ids, .. }
            | Attribute::Maybe { qualifier_ids, .. }
            | Attribute::Relative { qualifier_ids, .. }
            | Attribute::OneOf { qualifier_ids, .. } => qualifier_ids,
            Attribute::Conditional { .. } => &[],
        }
    }

    /// Resolves this attribute to a value, consulting any unknown-attribute
    /// patterns declared on `activation` before ever touching a concrete
    /// binding (spec §4.3 "Unknown integration").
    #[async_recursion]
    pub async fn resolve(&self, ctx: &EvalContext, activation: &(dyn Activation + 'async_recursion)) -> Value {
        let qualifiers = self.qualifiers();
        let mut resolved_qualifiers = Vec::with_capacity(qualifiers.len());
        for q in qualifiers {
            match q.resolve(ctx, activation).await {
                Ok(rv) => resolved_qualifiers.push(rv),
                Err(short_circuit) => return short_circuit,
            }
        }

        if let Some(variable) = self.pattern_variable() {
            if let Some(depth) = best_pattern_match(activation.unknown_patterns(), variable, &resolved_qualifiers) {
                let id = if depth == 0 {
                    self.id()
                } else {
                    self.qualifier_ids()[depth - 1]
                };
                return Value::unknown(id);
            }
        }

        let base = match self.resolve_base(ctx, activation).await {
            Ok(v) => v,
            Err(v) => return v,
        };
        if base.is_error_or_unknown() {
            return base;
        }

        let mut value = base;
        for rv in &resolved_qualifiers {
            if value.is_error_or_unknown() {
                return value;
            }
            value = qualifier::apply(&value, rv);
        }
        value
    }

    fn pattern_variable(&self) -> Option<&str> {
        match self {
            Attribute::Absolute { name, .. } | Attribute::Maybe { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    #[async_recursion]
    async fn resolve_base(&self, ctx: &EvalContext, activation: &(dyn Activation + 'async_recursion)) -> Result<Value, Value> {
        match self {
            Attribute::Absolute { name, .. } => resolve_named(ctx, activation, std::slice::from_ref(name), !self.qualifiers().is_empty()),
            Attribute::Maybe { name, .. } => {
                let candidates = ctx.registry.resolve_candidate_names(name);
                resolve_named(ctx, activation, &candidates, !self.qualifiers().is_empty())
            }
            Attribute::OneOf { candidates, .. } => resolve_named(ctx, activation, candidates, !self.qualifiers().is_empty()),
            Attribute::Relative { operand, .. } => {
                let v = evaluate_recorded(operand.as_ref(), ctx, activation).await;
                if v.is_error_or_unknown() {
                    Err(v)
                } else {
                    Ok(v)
                }
            }
            Attribute::Conditional { cond, truthy, falsy, .. } => {
                let c = evaluate_recorded(cond.as_ref(), ctx, activation).await;
                match c {
                    Value::Bool(true) => Ok(truthy.resolve(ctx, activation).await),
                    Value::Bool(false) => Ok(falsy.resolve(ctx, activation).await),
                    other if other.is_error_or_unknown() => Err(other),
                    other => Err(Value::error(Error::type_mismatch("bool", other.type_name()).to_string())),
                }
            }
        }
    }
}

/// Tries each candidate name against the activation, then the registry's
/// identifiers, then the registry's type names (spec §4.3 Absolute: "on
/// miss, try the type registry (names → type values); on hit with
/// qualifiers, return Error ('no such attribute'); with no qualifiers,
/// return the type value"). `has_qualifiers` is whether the attribute this
/// candidate list came from carries any qualifiers beyond the bare name.
fn resolve_named(ctx: &EvalContext, activation: &dyn Activation, candidates: &[String], has_qualifiers: bool) -> Result<Value, Value> {
    for name in candidates {
        if let Some(v) = activation.resolve(name) {
            return Ok(v);
        }
        if let Some(v) = ctx.registry.find_ident(name) {
            return Ok(v);
        }
        if let Some(type_value) = ctx.registry.find_type(name) {
            return if has_qualifiers {
                Err(Value::error(Error::NoSuchAttribute(name.clone()).to_string()))
            } else {
                Ok(type_value)
            };
        }
    }
    Err(Value::error(Error::NoSuchAttribute(candidates.join(" | ")).to_string()))
}

/// Picks the matching pattern with the longest matched prefix (spec §4.3:
/// "most specific (longest matched prefix) wins", refining the upstream
/// first-hit rule per spec §9 open question (b)).
fn best_pattern_match(patterns: &[AttributePattern], variable: &str, actual: &[QualifierValue]) -> Option<usize> {
    patterns.iter().filter_map(|p| p.match_depth(variable, actual)).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{AttributePattern as Pattern, MapActivation};
    use crate::dispatcher::DispatcherBuilder;
    use crate::types::EmptyTypeRegistry;
    use std::sync::Arc as StdArc;

    fn ctx() -> EvalContext {
        EvalContext::new(DispatcherBuilder::new().build(), StdArc::new(EmptyTypeRegistry))
    }

    #[tokio::test]
    async fn deepest_matching_pattern_wins_over_attribute_id() {
        // a[0].c unknown, but a[0] resolves to 1 (spec §8 scenario).
        let mut attr = Attribute::absolute(100, "a");
        attr.push_qualifier(101, Qualifier::Int(0));
        attr.push_qualifier(102, Qualifier::Field { name: "c".into(), meta: None });

        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let base = MapActivation::new().with("a", list);
        let pattern = Pattern::new("a").index(0).field("c").build();
        let partial = crate::activation::PartialActivation::new(StdArc::new(base), vec![pattern]);

        let c = ctx();
        let v = attr.resolve(&c, &partial).await;
        assert_eq!(v.as_unknown().unwrap().ids(), &[102]);
    }

    #[tokio::test]
    async fn unmatched_prefix_falls_through_to_ordinary_resolution() {
        let mut attr = Attribute::absolute(100, "a");
        attr.push_qualifier(101, Qualifier::Int(0));

        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let base = MapActivation::new().with("a", list);
        let partial = crate::activation::PartialActivation::new(StdArc::new(base), vec![]);

        let c = ctx();
        let v = attr.resolve(&c, &partial).await;
        assert_eq!(v.as_int(), Some(1));
    }
}
