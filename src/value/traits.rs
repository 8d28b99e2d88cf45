//! Optional per-type traits (spec §3: "optional per-type traits (indexer,
//! container, field tester, iterable, receiver)").
//!
//! `Value` answers each trait query by matching on its own variant rather
//! than by implementing these as object-safe trait objects — there is no
//! host-extensible value shape, so a closed match is both simpler and
//! cheaper than dynamic dispatch. The traits below exist as documentation
//! of the contract and as the vocabulary [`crate::attribute`] qualifies
//! against; `Value`'s inherent methods are the actual implementation.

use super::{MapKey, Value};
use crate::err::ErrorValue;

/// A value that can be qualified by integer index (list, string, bytes).
pub trait Indexer {
    fn index(&self, i: i64) -> Result<Value, ErrorValue>;
}

/// A value that can be qualified by a typed key (map) or tested for key
/// membership.
pub trait Container {
    fn get_key(&self, key: &MapKey) -> Option<&Value>;
    fn contains_key(&self, key: &MapKey) -> bool {
        self.get_key(key).is_some()
    }
}

/// A value that can answer `has(x.field)` without materializing the field.
pub trait FieldTester {
    fn has_field(&self, field: &str) -> bool;
}

/// A value whose elements can be visited in order, used by comprehension
/// folds and `in`/set-membership.
pub trait Iterable {
    fn iter_values(&self) -> Box<dyn Iterator<Item = Value> + '_>;
}

/// A value that can act as the implicit receiver of a method-style call
/// (spec §4.2: "attempt a receiver dispatch (method on arg0)").
pub trait Receiver {
    fn type_name_for_receiver(&self) -> &'static str;
}

impl Indexer for Value {
    fn index(&self, i: i64) -> Result<Value, ErrorValue> {
        match self {
            Value::List(items) => {
                let idx = resolve_index(i, items.len())?;
                Ok(items[idx].clone())
            }
            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let idx = resolve_index(i, chars.len())?;
                Ok(Value::string(chars[idx].to_string()))
            }
            Value::Bytes(b) => {
                let idx = resolve_index(i, b.len())?;
                Ok(Value::Int(b[idx] as i64))
            }
            other => Err(ErrorValue::new(format!("{} is not indexable", other.type_name()))),
        }
    }
}

fn resolve_index(i: i64, len: usize) -> Result<usize, ErrorValue> {
    if i < 0 {
        return Err(ErrorValue::new(format!("negative index not supported: {i}")));
    }
    let idx = i as usize;
    if idx >= len {
        return Err(ErrorValue::new(format!("index out of range: {i} (len {len})")));
    }
    Ok(idx)
}

impl Container for Value {
    fn get_key(&self, key: &MapKey) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }
}

impl FieldTester for Value {
    fn has_field(&self, field: &str) -> bool {
        match self {
            Value::Object(o) => o.get(field).is_some(),
            Value::Map(m) => m.contains_key(&MapKey::String(field.to_string())),
            _ => false,
        }
    }
}

impl Iterable for Value {
    fn iter_values(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        match self {
            Value::List(items) => Box::new(items.iter().cloned()),
            Value::Map(m) => Box::new(m.keys().map(|k| match k {
                MapKey::Bool(b) => Value::Bool(*b),
                MapKey::Int(i) => Value::Int(*i),
                MapKey::Uint(u) => Value::Uint(*u),
                MapKey::String(s) => Value::string(s.clone()),
            })),
            _ => Box::new(std::iter::empty()),
        }
    }
}

impl Receiver for Value {
    fn type_name_for_receiver(&self) -> &'static str {
        self.type_name()
    }
}

impl Value {
    pub fn is_iterable(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }
}
