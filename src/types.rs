//! Core value types shared by the registries and evaluators.
//!
//! Every column of a row record is classified by a [`ColumnKind`], and every live field value
//! travels through the engine as a [`Value`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value category of a registered column.
///
/// The kind decides how filter literals are parsed, which [`crate::expr::Operator`]s are legal,
/// and which [`crate::processing::ReduceOp`]s can fold the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Real,
    /// Free-form UTF-8 string.
    String,
    /// Enum-like symbolic string (e.g. `Up`/`Down`), optionally restricted to a set of values.
    Symbolic,
}

impl ColumnKind {
    /// Whether the kind has a numeric order (and therefore supports ordering operators and
    /// numeric aggregates).
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Real)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Real => "real",
            ColumnKind::String => "string",
            ColumnKind::Symbolic => "symbolic",
        };
        f.write_str(s)
    }
}

/// A single typed value read from a row, parsed from a literal, or produced by an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/unset value (e.g. an optional field that is not populated).
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string (used for both string and symbolic columns).
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("--"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Utf8(v.clone())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
