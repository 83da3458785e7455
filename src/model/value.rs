//! Universal value type held by object properties.

use std::fmt;

use super::ObjectRef;
use crate::{Error, Result};

/// Runtime value of a property.
///
/// Covers the scalar types, lists, and references to other objects in the
/// graph. Runtime typing is strict: an `Int` never equals a `Float`, and
/// `Object` values compare by identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Object(ObjectRef),
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
            Value::List(_) => "LIST",
            Value::Object(_) => "OBJECT",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Object references held by this value: itself, or the elements of a list.
    pub fn objects(&self) -> Vec<ObjectRef> {
        match self {
            Value::Object(o) => vec![o.clone()],
            Value::List(items) => items.iter().filter_map(|v| v.as_object().cloned()).collect(),
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<ObjectRef> for Value { fn from(v: ObjectRef) -> Self { Value::Object(v) } }
impl From<&ObjectRef> for Value { fn from(v: &ObjectRef) -> Self { Value::Object(v.clone()) } }
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self { Value::List(v.into_iter().map(Into::into).collect()) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Value::Null) }
}

/// Strict conversion out of a `Value`.
///
/// Only the exact runtime type converts; there is no numeric widening and
/// no string parsing. Matchers rely on the failure case to treat a
/// mismatched value as "does not match".
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self>;
}

fn type_error(expected: &str, val: &Value) -> Error {
    Error::TypeError {
        expected: expected.into(),
        got: val.type_name().into(),
    }
}

impl FromValue for Value {
    fn from_value(val: &Value) -> Result<Self> {
        Ok(val.clone())
    }
}

impl FromValue for bool {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Bool(b) => Ok(*b),
            _ => Err(type_error("BOOLEAN", val)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_int().ok_or_else(|| type_error("INTEGER", val))
    }
}

impl FromValue for f64 {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_float().ok_or_else(|| type_error("FLOAT", val))
    }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::String(s) => Ok(s.clone()),
            _ => Err(type_error("STRING", val)),
        }
    }
}

impl FromValue for ObjectRef {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_object().cloned().ok_or_else(|| type_error("OBJECT", val))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => Err(type_error("LIST", val)),
        }
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Object(o) => write!(f, "{}#{}", o.type_name(), o.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from("hello"), Value::String("hello".into()));
        assert_eq!(Value::from(42), Value::Int(42));
        assert_eq!(Value::from(3.5), Value::Float(3.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_int_and_float_never_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(f64::from_value(&Value::Int(1)).ok(), None);
        assert_eq!(i64::from_value(&Value::Float(1.0)).ok(), None);
    }

    #[test]
    fn test_object_equality_is_identity() {
        let a = ObjectRef::builder("Node").build().unwrap();
        let b = ObjectRef::builder("Node").build().unwrap();
        assert_eq!(Value::from(&a), Value::from(a.clone()));
        assert_ne!(Value::from(&a), Value::from(&b));
    }

    #[test]
    fn test_list_conversion_is_all_or_nothing() {
        let tags = Value::from(vec!["a", "b"]);
        assert_eq!(Vec::<String>::from_value(&tags).unwrap(), vec!["a", "b"]);

        let mixed = Value::List(vec![Value::from("a"), Value::from(1)]);
        assert!(Vec::<String>::from_value(&mixed).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::from("a\"b").to_string(), "\"a\\\"b\"");
    }
}
