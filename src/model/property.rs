//! Property: a named, typed attribute reflected off an object.

use std::fmt;

use serde::{Deserialize, Serialize};
use super::Value;

/// Declared semantic type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Any,
    Bool,
    Int,
    Float,
    String,
    Object,
    List(Box<PropertyType>),
}

impl PropertyType {
    /// List type with the given element type.
    pub fn list_of(element: PropertyType) -> Self {
        PropertyType::List(Box::new(element))
    }

    /// Whether a value may be stored under this declared type.
    /// `Null` is accepted everywhere (an unset property).
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (PropertyType::Any, _) => true,
            (PropertyType::Bool, Value::Bool(_)) => true,
            (PropertyType::Int, Value::Int(_)) => true,
            (PropertyType::Float, Value::Float(_)) => true,
            (PropertyType::String, Value::String(_)) => true,
            (PropertyType::Object, Value::Object(_)) => true,
            (PropertyType::List(elem), Value::List(items)) => {
                items.iter().all(|v| !v.is_null() && elem.accepts(v))
            }
            _ => false,
        }
    }

    /// Element type for list types.
    pub fn element_type(&self) -> Option<&PropertyType> {
        match self {
            PropertyType::List(elem) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Any => write!(f, "ANY"),
            PropertyType::Bool => write!(f, "BOOLEAN"),
            PropertyType::Int => write!(f, "INTEGER"),
            PropertyType::Float => write!(f, "FLOAT"),
            PropertyType::String => write!(f, "STRING"),
            PropertyType::Object => write!(f, "OBJECT"),
            PropertyType::List(elem) => write!(f, "LIST<{elem}>"),
        }
    }
}

/// A reflected `{name, declared_type, value}` snapshot of one property.
///
/// Snapshots are detached from the object: later writes to the object do
/// not show up in a property that was already reflected.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub declared_type: PropertyType,
    pub value: Value,
}

impl Property {
    pub fn new(name: impl Into<String>, declared_type: PropertyType, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            declared_type,
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &PropertyType {
        &self.declared_type
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}
