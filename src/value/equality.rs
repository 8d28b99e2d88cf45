use super::Value;
use std::fmt;

/// Two operands that cannot be compared at all (distinct, non-numeric
/// types). Distinguished from a plain `bool` result so callers can turn it
/// into `Value::Error` with a useful message (spec §4.2: "tri-valued:
/// value/Error").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EqError {
    pub left: &'static str,
    pub right: &'static str,
}

impl fmt::Display for EqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no such overload: equal({}, {})", self.left, self.right)
    }
}

/// Tri-valued equality (spec §3, §4.2). Numeric types compare across
/// `Int`/`Uint`/`Double` by value; every other pairing of distinct types
/// is an `EqError`, matching CEL's strict-typing stance on `==`.
pub fn value_equals(a: &Value, b: &Value) -> Result<bool, EqError> {
    use Value::*;
    match (a, b) {
        (Null, Null) => Ok(true),
        (Bool(x), Bool(y)) => Ok(x == y),
        (String(x), String(y)) => Ok(x == y),
        (Bytes(x), Bytes(y)) => Ok(x == y),
        (Timestamp(x), Timestamp(y)) => Ok(x == y),
        (Duration(x), Duration(y)) => Ok(x == y),
        (Type(x), Type(y)) => Ok(x == y),
        (List(x), List(y)) => {
            if x.len() != y.len() {
                return Ok(false);
            }
            for (l, r) in x.iter().zip(y.iter()) {
                if !value_equals(l, r)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Map(x), Map(y)) => {
            if x.len() != y.len() {
                return Ok(false);
            }
            for (k, l) in x.iter() {
                match y.get(k) {
                    Some(r) if value_equals(l, r)? => {}
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        (Object(x), Object(y)) => Ok(x == y),
        (Int(x), Int(y)) => Ok(x == y),
        (Uint(x), Uint(y)) => Ok(x == y),
        (Double(x), Double(y)) => Ok(x == y),
        (Int(x), Uint(y)) | (Uint(y), Int(x)) => Ok(*x >= 0 && *x as u64 == *y),
        (Int(x), Double(y)) | (Double(y), Int(x)) => Ok((*x as f64) == *y),
        (Uint(x), Double(y)) | (Double(y), Uint(x)) => Ok((*x as f64) == *y),
        (Error(x), Error(y)) => Ok(x == y),
        (Unknown(x), Unknown(y)) => Ok(x == y),
        _ => Err(EqError {
            left: a.type_name(),
            right: b.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn numeric_cross_type_equal() {
        assert_eq!(value_equals(&Value::Int(1), &Value::Double(1.0)), Ok(true));
        assert_eq!(value_equals(&Value::Uint(1), &Value::Int(1)), Ok(true));
    }

    #[test]
    fn incomparable_types_error() {
        assert!(value_equals(&Value::Bool(true), &Value::Int(1)).is_err());
    }

    #[test]
    fn lists_compare_elementwise() {
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(value_equals(&a, &b), Ok(true));
    }
}
