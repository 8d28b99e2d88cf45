//! Decorators (spec §4.1 "Decorator pipeline"): Optimize, Exhaustive, and
//! Observe.
//!
//! Exhaustive and Observe are threaded through [`super::Planner`] as plain
//! fields rather than implemented as a second pass over the already-built
//! executable tree: the tree is made of opaque `dyn ExecutableNode` trait
//! objects with no reflection, so "replace a node with another" happens
//! once, at the point [`super::Planner::lower`] constructs it, instead of
//! via a separate tree-rewriting visitor afterward. The externally
//! observable effect — short-circuit nodes may run exhaustively, every
//! node's result may be reported to a sink — is identical either way; see
//! DESIGN.md for the tradeoff.
//!
//! Optimize is the one decorator that needs its own helpers here, since
//! both constant folding and set-membership detection inspect the *input*
//! `Expr` tree — which, unlike the executable tree, is plain data — before
//! a node is ever built.

use crate::planner::ast::Expr;
use crate::value::{MapKey, Value};
use std::collections::{BTreeMap, HashSet};

/// Recursively evaluates `expr` if it is built entirely out of constants —
/// a bare `Const`, or a `CreateList`/`CreateMap` whose every element is
/// itself constant (spec §4.1 Optimize (a)). Anything else (an identifier,
/// a call, a comprehension) returns `None`: constant folding never
/// evaluates code that could have a side effect or fail at runtime for a
/// reason other than its own fixed shape.
pub fn try_const_eval(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Const { value, .. } => Some(value.clone()),
        Expr::CreateList { elements, .. } => {
            let mut out = Vec::with_capacity(elements.len());
            for e in elements {
                out.push(try_const_eval(e)?);
            }
            Some(Value::list(out))
        }
        Expr::CreateMap { entries, .. } => {
            let mut map = BTreeMap::new();
            for (k, v) in entries {
                let key = MapKey::try_from(&try_const_eval(k)?).ok()?;
                let value = try_const_eval(v)?;
                map.insert(key, value);
            }
            Some(Value::map(map))
        }
        _ => None,
    }
}

/// Builds the `(member_type_name, set)` pair for a `SetMembershipNode` if
/// every element of `elements` is constant and they all share one of the
/// hashable qualifier-legal primitive types (spec §4.1 Optimize (c):
/// "constant and homogeneous over primitive types"). `None` means the
/// planner should fall back to the generic `InNode` — including for the
/// empty list, where there is no member type to fix.
pub fn try_build_set(elements: &[Expr]) -> Option<(&'static str, HashSet<MapKey>)> {
    let mut member_type: Option<&'static str> = None;
    let mut set = HashSet::with_capacity(elements.len());
    for e in elements {
        let v = try_const_eval(e)?;
        let type_name = match v.type_name() {
            t @ ("bool" | "int" | "uint" | "string") => t,
            _ => return None,
        };
        match member_type {
            None => member_type = Some(type_name),
            Some(t) if t == type_name => {}
            Some(_) => return None,
        }
        set.insert(MapKey::try_from(&v).ok()?);
    }
    Some((member_type?, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn folds_nested_constant_list() {
        let expr = Expr::CreateList {
            id: 1,
            elements: vec![Expr::Const { id: 2, value: Value::Int(1) }, Expr::Const { id: 3, value: Value::Int(2) }],
        };
        let folded = try_const_eval(&expr).unwrap();
        assert_eq!(folded.to_string(), "[1, 2]");
    }

    #[test]
    fn refuses_to_fold_identifier() {
        let expr = Expr::Ident { id: 1, name: "x".into(), qualified: true };
        assert!(try_const_eval(&expr).is_none());
    }

    #[test]
    fn set_requires_homogeneous_primitive_members() {
        let ints = vec![Expr::Const { id: 1, value: Value::Int(1) }, Expr::Const { id: 2, value: Value::Int(2) }];
        assert!(try_build_set(&ints).is_some());

        let mixed = vec![Expr::Const { id: 1, value: Value::Int(1) }, Expr::Const { id: 2, value: Value::string("2") }];
        assert!(try_build_set(&mixed).is_none());
    }
}
