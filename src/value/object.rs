use super::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A proto-like message value: a type name plus a field map, with optional
/// per-field "is this field explicitly set" metadata so
/// `FieldExistsTest` (spec §4.2 `has(...)`) can use the fast path instead
/// of falling back to plain membership.
#[derive(Clone, Debug)]
pub struct ObjectValue {
    pub type_name: String,
    fields: BTreeMap<String, Value>,
    /// Fields present in this set are known to be explicitly assigned
    /// (proto3 "set" semantics); fields absent from both this set and
    /// `fields` are simply undefined.
    explicitly_set: BTreeMap<String, bool>,
}

impl ObjectValue {
    pub fn new(type_name: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        ObjectValue {
            type_name: type_name.into(),
            fields,
            explicitly_set: BTreeMap::new(),
        }
    }

    pub fn with_field_presence(mut self, field: impl Into<String>, is_set: bool) -> Self {
        self.explicitly_set.insert(field.into(), is_set);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// `isSet` metadata per spec §4.2 `FieldExistsTest`: `Some(bool)` when
    /// the object carries explicit presence tracking for this field,
    /// `None` to signal the caller should fall back to plain membership.
    pub fn is_set_metadata(&self, field: &str) -> Option<bool> {
        self.explicitly_set.get(field).copied()
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        if self.type_name != other.type_name || self.fields.len() != other.fields.len() {
            return false;
        }
        self.fields.iter().all(|(k, v)| match other.fields.get(k) {
            Some(rv) => super::equality::value_equals(v, rv).unwrap_or(false),
            None => false,
        })
    }
}

impl Eq for ObjectValue {}

impl std::hash::Hash for ObjectValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
    }
}

impl fmt::Display for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}
