//! Qualifiers: the steps applied to an attribute's base value (spec §3/§4.3).

use crate::activation::{Activation, QualifierValue};
use crate::node::{evaluate_recorded, BoxFuture, EvalContext, ExecutableNode};
use crate::types::FieldMeta;
use crate::value::{MapKey, Value};
use std::sync::Arc;

/// One step in an attribute's qualifier chain.
///
/// `Dynamic` is the "dynamic-attribute" variant from spec §3: the
/// qualifier's own value is not known until another subtree is evaluated
/// (`a[b]`, `a[f(x)]`), so it carries a nested executable node rather than
/// a literal.
#[derive(Clone)]
pub enum Qualifier {
    String(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
    Field { name: String, meta: Option<FieldMeta> },
    Dynamic(Arc<dyn ExecutableNode>),
}

impl Qualifier {
    /// Resolves this qualifier to a concrete [`QualifierValue`], evaluating
    /// the nested node for `Dynamic` qualifiers. Returns `Err(value)` with
    /// the short-circuiting error/unknown `Value` when resolution can't
    /// produce a usable key.
    pub fn resolve<'a>(&'a self, ctx: &'a EvalContext, activation: &'a dyn Activation) -> BoxFuture<'a, Result<QualifierValue, Value>> {
        Box::pin(async move {
            match self {
                Qualifier::String(s) => Ok(QualifierValue::String(s.clone())),
                Qualifier::Int(i) => Ok(QualifierValue::Int(*i)),
                Qualifier::Uint(u) => Ok(QualifierValue::Uint(*u)),
                Qualifier::Bool(b) => Ok(QualifierValue::Bool(*b)),
                Qualifier::Field { name, .. } => Ok(QualifierValue::String(name.clone())),
                Qualifier::Dynamic(node) => {
                    let v = evaluate_recorded(node.as_ref(), ctx, activation).await;
                    if v.is_error_or_unknown() {
                        return Err(v);
                    }
                    qualifier_value_of(&v).ok_or_else(|| Value::error(format!("invalid qualifier type: {}", v.type_name())))
                }
            }
        })
    }

    pub fn field_meta(&self) -> Option<&FieldMeta> {
        match self {
            Qualifier::Field { meta, .. } => meta.as_ref(),
            _ => None,
        }
    }
}

fn qualifier_value_of(v: &Value) -> Option<QualifierValue> {
    match v {
        Value::String(s) => Some(QualifierValue::String(s.as_str().to_string())),
        Value::Int(i) => Some(QualifierValue::Int(*i)),
        Value::Uint(u) => Some(QualifierValue::Uint(*u)),
        Value::Bool(b) => Some(QualifierValue::Bool(*b)),
        _ => None,
    }
}

/// Applies one resolved qualifier to `value`, producing the field/index/key
/// lookup result, or the appropriate spec §7 error.
pub fn apply(value: &Value, qualifier: &QualifierValue) -> Value {
    match value {
        Value::List(_) | Value::String(_) | Value::Bytes(_) => match qualifier {
            QualifierValue::Int(i) => match crate::value::Indexer::index(value, *i) {
                Ok(v) => v,
                Err(e) => Value::error_value(e),
            },
            other => Value::error(format!("invalid index type for {}: {other:?}", value.type_name())),
        },
        Value::Map(map) => {
            let key = match qualifier {
                QualifierValue::String(s) => MapKey::String(s.clone()),
                QualifierValue::Int(i) => MapKey::Int(*i),
                QualifierValue::Uint(u) => MapKey::Uint(*u),
                QualifierValue::Bool(b) => MapKey::Bool(*b),
            };
            // Spec §4.3 distinguishes "key type must match the map's key
            // type; on mismatch return Error" from "missing key is Error
            // ('no such key: K')" — checked against an actual key already
            // in the map, since `MapValue` carries no separate key-type tag.
            if let Some((existing_key, _)) = map.iter().next() {
                if std::mem::discriminant(existing_key) != std::mem::discriminant(&key) {
                    return Value::error(crate::err::Error::type_mismatch(existing_key.type_name(), key.type_name()).to_string());
                }
            }
            match map.get(&key) {
                Some(v) => v.clone(),
                None => Value::error(crate::err::Error::NoSuchKey(key.to_string()).to_string()),
            }
        }
        Value::Object(obj) => {
            let field_name = match qualifier {
                QualifierValue::String(s) => s.as_str(),
                _ => return Value::error("object fields must be qualified by name".to_string()),
            };
            match obj.get(field_name) {
                Some(v) => v.clone(),
                None => Value::error(crate::err::Error::NoSuchField(field_name.to_string()).to_string()),
            }
        }
        Value::Error(_) | Value::Unknown(_) => value.clone(),
        other => Value::error(format!("no such overload: index({})", other.type_name())),
    }
}
