//! Primitive node values and their conversion from JSON input.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single leaf value: the only element types a node value may hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Int(i64),
    Str(String),
}

impl Primitive {
    /// Convert a JSON leaf into a primitive.
    ///
    /// `field` names the subtype being converted and only feeds the error.
    pub fn from_json(field: &str, value: &Value) -> Result<Self, GraphError> {
        match value {
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .ok_or_else(|| GraphError::type_mismatch(field, "int or str", json_kind(value))),
            other => Err(GraphError::type_mismatch(field, "int or str", json_kind(other))),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Primitive {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Primitive {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// Convert a JSON field value into an ordered primitive sequence.
///
/// A scalar becomes a one-element sequence. An array is accepted only if every
/// element is an integer or a string; order is preserved. An empty array
/// yields an empty sequence.
pub fn sequence_from_json(field: &str, value: &Value) -> Result<Vec<Primitive>, GraphError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                Primitive::from_json(field, item).map_err(|_| {
                    GraphError::type_mismatch(field, "int or str element", json_kind(item))
                })
            })
            .collect(),
        Value::String(_) | Value::Number(_) => Ok(vec![Primitive::from_json(field, value)?]),
        other => Err(GraphError::type_mismatch(
            field,
            "int, str or list",
            json_kind(other),
        )),
    }
}

/// Short name for the kind of a JSON value, used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(n) if n.as_i64().is_none() => "out-of-range integer",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
