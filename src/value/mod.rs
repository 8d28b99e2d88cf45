//! The universal runtime value (spec §3).
//!
//! `Value` is a closed tagged union rather than a trait-object hierarchy —
//! the same choice the teacher makes for its `sql::Value` enum — because
//! the set of runtime shapes is fixed by the language and callers need
//! structural matching (equality, qualification, folding) far more often
//! than they need open extension. The two points that do need host
//! extension, the type registry and the dispatcher, live outside `Value`
//! entirely (see [`crate::types`] and [`crate::dispatcher`]).

mod equality;
mod object;
mod traits;
mod unknown;

pub use equality::EqError;
pub use object::ObjectValue;
pub use traits::{Container, FieldTester, Indexer, Iterable, Receiver};
pub use unknown::Unknown;

use crate::err::ErrorValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A list value. Reference-counted so cloning during attribute resolution
/// and comprehension folding is O(1).
pub type ListValue = Arc<Vec<Value>>;

/// A map value. Keys are restricted to the qualifier-legal key types by
/// construction (see [`crate::attribute::Qualifier`]); `MapKey` enforces
/// that restriction so `Value::Map` cannot hold an arbitrary `Value` as a
/// key.
pub type MapValue = Arc<BTreeMap<MapKey, Value>>;

/// The legal map-key variants (spec §3 qualifier invariant (i)).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::Int(i) => write!(f, "{i}"),
            MapKey::Uint(u) => write!(f, "{u}"),
            MapKey::String(s) => write!(f, "{s}"),
        }
    }
}

impl MapKey {
    pub fn type_name(&self) -> &'static str {
        match self {
            MapKey::Bool(_) => "bool",
            MapKey::Int(_) => "int",
            MapKey::Uint(_) => "uint",
            MapKey::String(_) => "string",
        }
    }
}

impl TryFrom<&Value> for MapKey {
    type Error = ErrorValue;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bool(b) => Ok(MapKey::Bool(*b)),
            Value::Int(i) => Ok(MapKey::Int(*i)),
            Value::Uint(u) => Ok(MapKey::Uint(*u)),
            Value::String(s) => Ok(MapKey::String(s.as_ref().clone())),
            other => Err(ErrorValue::new(format!("unsupported map key type: {}", other.type_name()))),
        }
    }
}

/// The runtime value. See module docs and spec §3.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Arc<String>),
    Bytes(Arc<Vec<u8>>),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Duration(chrono::Duration),
    List(ListValue),
    Map(MapValue),
    Object(Arc<ObjectValue>),
    /// A type value, e.g. the result of evaluating a bare type name, or the
    /// operand of `type(x)`.
    Type(Arc<String>),
    /// A propagated failure. Carries only a message (spec §3); the full
    /// [`crate::err::Error`] detail is collapsed at the point of failure.
    Error(Arc<ErrorValue>),
    /// A value whose inputs are missing. Carries a non-empty,
    /// deduplicated, order-preserving sequence of expression ids.
    Unknown(Unknown),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(Arc::new(s.into()))
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(Arc::new(b.into()))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Arc::new(items))
    }

    pub fn map(entries: BTreeMap<MapKey, Value>) -> Value {
        Value::Map(Arc::new(entries))
    }

    pub fn error(message: impl Into<String>) -> Value {
        Value::Error(Arc::new(ErrorValue::new(message)))
    }

    pub fn error_value(e: ErrorValue) -> Value {
        Value::Error(Arc::new(e))
    }

    pub fn unknown(id: i64) -> Value {
        Value::Unknown(Unknown::single(id))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    pub fn is_error_or_unknown(&self) -> bool {
        self.is_error() || self.is_unknown()
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_unknown(&self) -> Option<&Unknown> {
        match self {
            Value::Unknown(u) => Some(u),
            _ => None,
        }
    }

    /// Merges two unknowns, or returns whichever operand is the sole
    /// Unknown, used by the strict binary propagation rule in spec §4.2.
    pub fn merge_unknown(a: Value, b: Value) -> Value {
        match (a, b) {
            (Value::Unknown(a), Value::Unknown(b)) => Value::Unknown(a.merge(b)),
            (Value::Unknown(u), _) | (_, Value::Unknown(u)) => Value::Unknown(u),
            (a, _) => a,
        }
    }

    /// The stable type tag used for error messages, `type(x)` and
    /// `SetMembership`'s recorded member type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Duration(_) => "duration",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Type(_) => "type",
            Value::Error(_) => "error",
            Value::Unknown(_) => "unknown",
        }
    }

    /// CEL truthiness: only `Bool(true)`.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Tri-valued equality (spec §3/§4.2): `Ok(true)`/`Ok(false)` for a
    /// decisive comparison, `Err` when the two operands cannot be
    /// compared at all (distinct incomparable types).
    pub fn equals(&self, other: &Value) -> Result<bool, EqError> {
        equality::value_equals(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}u"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "bytes({} bytes)", b.len()),
            Value::Timestamp(t) => write!(f, "{t}"),
            Value::Duration(d) => write!(f, "{d}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Object(o) => write!(f, "{o}"),
            Value::Type(t) => write!(f, "type({t})"),
            Value::Error(e) => write!(f, "error({e})"),
            Value::Unknown(u) => write!(f, "unknown({u})"),
        }
    }
}
