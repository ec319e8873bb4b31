//! Opaque values carried by the store
use std::fmt;

use serde::{Deserialize, Serialize};

/// A value stored under a key.
///
/// Serialized untagged, so on the wire a value is just the plain JSON
/// scalar (or an array of bytes).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Non-finite floats have no JSON form and travel as `null`, so they are
    /// stored as `Null` too.
    pub fn normalize(self) -> Self {
        match self {
            Value::Float(x) if !x.is_finite() => Value::Null,
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl std::str::FromStr for Value {
    type Err = std::convert::Infallible;

    /// Parse CLI input: JSON scalars are taken as-is, anything else is text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str::<Value>(s).unwrap_or_else(|_| Value::Text(s.to_string())))
    }
}
