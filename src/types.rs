//! The type registry / adapter collaborator (spec §2.3, §6).
//!
//! This is one of the two points (along with [`crate::dispatcher`]) where
//! the core accepts host extension, so it is a plain object-safe trait
//! rather than a closed enum — the opposite design choice from
//! [`crate::value::Value`], deliberately: spec §9 calls out that open
//! interfaces are used "only where user extension is required (type
//! registry, dispatcher implementation, async implementation)".

use crate::err::Error;
use crate::value::Value;
use std::collections::BTreeMap;

/// Per-field metadata the registry can supply when it knows a type's
/// shape ahead of time, enabling the qualification fast path in spec §4.3
/// ("Proto‑like message: by field meta when available (fast path, no
/// value lifting)").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldMeta {
    pub name: String,
    pub declaring_type: String,
    /// Whether this field supports proto3-style explicit presence
    /// tracking (feeds `FieldExistsTest`'s fast path).
    pub supports_presence: bool,
}

/// Resolves qualified type names, constructs objects from field maps, and
/// lifts native host values into the value model (spec §6).
pub trait TypeRegistry: Send + Sync {
    /// Look up a type by its fully qualified name, e.g. for a bare type
    /// reference (`google.protobuf.Any`) used as a value.
    fn find_type(&self, qualified_name: &str) -> Option<Value>;

    /// Look up a well-known identifier (e.g. a package-level constant)
    /// that isn't supplied by the activation.
    fn find_ident(&self, qualified_name: &str) -> Option<Value>;

    /// Construct a value of `type_name` from a `field -> value` map,
    /// as required by `CreateObject` (spec §4.2).
    fn new_value(&self, type_name: &str, fields: BTreeMap<String, Value>) -> Result<Value, Error>;

    /// Lift an opaque host value already encoded as [`Value`] through any
    /// registry-specific coercions (e.g. wrapper-type unwrapping). The
    /// default implementation is the identity function, which is correct
    /// for registries with no such coercions.
    fn native_to_value(&self, native: Value) -> Value {
        native
    }

    /// Field metadata for `type_name.field_name`, if known ahead of time.
    fn find_field_type(&self, type_name: &str, field_name: &str) -> Option<FieldMeta>;

    /// Expands an unqualified identifier into its ordered list of
    /// fully-qualified candidate names under the current container's
    /// namespace resolution rules (spec §3 "Maybe" attribute, §4.1
    /// "container/namespace candidates").
    fn resolve_candidate_names(&self, name: &str) -> Vec<String>;
}

/// A registry with no types and no namespace container — candidate
/// expansion is the identity (`[name]`), matching spec §4.1's "checked
/// identifiers lower to Absolute attributes with a single candidate
/// name". Useful for hosts that do all qualification during type
/// checking and hand the core only absolute names.
#[derive(Default)]
pub struct EmptyTypeRegistry;

impl TypeRegistry for EmptyTypeRegistry {
    fn find_type(&self, _qualified_name: &str) -> Option<Value> {
        None
    }

    fn find_ident(&self, _qualified_name: &str) -> Option<Value> {
        None
    }

    fn new_value(&self, type_name: &str, _fields: BTreeMap<String, Value>) -> Result<Value, Error> {
        Err(Error::ConstructionFailed {
            type_name: type_name.to_string(),
            message: "no type registry configured".to_string(),
        })
    }

    fn find_field_type(&self, _type_name: &str, _field_name: &str) -> Option<FieldMeta> {
        None
    }

    fn resolve_candidate_names(&self, name: &str) -> Vec<String> {
        vec![name.to_string()]
    }
}
