//! Runtime-reflected models built from JSON result documents.
//!
//! Typed commands implement [`crate::row::RowModel`] statically. For results that only exist as
//! JSON (e.g. a thrift response dumped with `--fmt json`), [`JsonModel`] discovers the row
//! collection by inspecting field shapes:
//!
//! - the document must be an object
//! - exactly one top-level field must be an array whose elements are all objects
//!   (an empty array only counts when no field holds records)
//! - every other field is metadata and is carried through unchanged
//!
//! Row fields may be addressed with dot paths (e.g. `peer.name`) for nested objects. Numbers that
//! fit `i64` read as integers and everything else as reals, so a counter past `i64::MAX` is a
//! kind mismatch on an integer column; register such columns as real.

use serde_json::Map;

use crate::error::{EvalError, EvalResult};
use crate::row::{Row, RowModel};
use crate::types::Value;

/// One JSON object from the row collection.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRow {
    fields: Map<String, serde_json::Value>,
}

impl JsonRow {
    pub fn new(fields: Map<String, serde_json::Value>) -> Self {
        Self { fields }
    }

    pub fn into_inner(self) -> Map<String, serde_json::Value> {
        self.fields
    }
}

impl Row for JsonRow {
    /// Missing keys read as [`Value::Null`], since JSON producers omit unset optional fields.
    fn field(&self, column: &str) -> Option<Value> {
        Some(match get_by_dot_path(&self.fields, column) {
            None => Value::Null,
            Some(v) => convert_json_value(v),
        })
    }
}

/// A result model whose row collection was located at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonModel {
    name: String,
    collection: String,
    metadata: Map<String, serde_json::Value>,
    rows: Vec<JsonRow>,
}

impl JsonModel {
    /// Parse a JSON document and locate its row collection.
    pub fn from_json_str(name: impl Into<String>, input: &str) -> EvalResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EvalError::InvalidModelDocument {
                message: "json input is empty".to_string(),
            });
        }
        let value = serde_json::from_str::<serde_json::Value>(trimmed).map_err(|e| {
            EvalError::InvalidModelDocument {
                message: e.to_string(),
            }
        })?;
        Self::from_value(name, value)
    }

    /// Locate the single row collection of an already parsed document.
    pub fn from_value(name: impl Into<String>, value: serde_json::Value) -> EvalResult<Self> {
        let serde_json::Value::Object(mut metadata) = value else {
            return Err(EvalError::AmbiguousRowCollection {
                found: "a non-object document".to_string(),
            });
        };

        // An empty array only counts when no field actually holds records.
        let (filled, empty): (Vec<_>, Vec<_>) = metadata
            .iter()
            .filter(|(_, v)| is_row_collection(v))
            .partition(|(_, v)| v.as_array().is_some_and(|items| !items.is_empty()));
        let candidates: Vec<String> = (if filled.is_empty() { empty } else { filled })
            .into_iter()
            .map(|(k, _)| k.clone())
            .collect();
        let collection = match candidates.as_slice() {
            [one] => one.clone(),
            [] => {
                return Err(EvalError::AmbiguousRowCollection {
                    found: "no list-of-records field".to_string(),
                })
            }
            many => {
                return Err(EvalError::AmbiguousRowCollection {
                    found: format!("{} list-of-records fields ({})", many.len(), many.join(", ")),
                })
            }
        };

        let rows = match metadata.remove(&collection) {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::Object(fields) => Some(JsonRow::new(fields)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            name: name.into(),
            collection,
            metadata,
            rows,
        })
    }

    /// Name of the field that holds the rows.
    pub fn collection_field(&self) -> &str {
        &self.collection
    }

    /// Non-collection fields of the document.
    pub fn metadata(&self) -> &Map<String, serde_json::Value> {
        &self.metadata
    }

    /// Reassemble the document with the (possibly filtered) rows.
    pub fn into_value(self) -> serde_json::Value {
        let mut out = self.metadata;
        let rows = self
            .rows
            .into_iter()
            .map(|r| serde_json::Value::Object(r.into_inner()))
            .collect();
        out.insert(self.collection, serde_json::Value::Array(rows));
        serde_json::Value::Object(out)
    }
}

impl RowModel for JsonModel {
    type Row = JsonRow;

    fn model_name(&self) -> String {
        self.name.clone()
    }

    fn rows(&self) -> &[JsonRow] {
        &self.rows
    }

    fn rows_mut(&mut self) -> &mut Vec<JsonRow> {
        &mut self.rows
    }
}

fn is_row_collection(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Array(items) => items.iter().all(serde_json::Value::is_object),
        _ => false,
    }
}

fn get_by_dot_path<'a>(
    root: &'a Map<String, serde_json::Value>,
    path: &str,
) -> Option<&'a serde_json::Value> {
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        match current {
            serde_json::Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn convert_json_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Utf8(b.to_string()),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::Utf8(s.clone()),
        other => Value::Utf8(other.to_string()),
    }
}
