//! Encoding helpers between JSON documents and SQLite values.
//!
//! Documents are stored as compact JSON text. Keys keep their JSON type:
//! integers as INTEGER, strings as TEXT.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use tradingmind_core::collection::{Collection, RecordId};

use crate::Result;

pub fn encode_id(id: &RecordId) -> SqlValue {
  match id {
    RecordId::Int(n) => SqlValue::Integer(*n),
    RecordId::Text(s) => SqlValue::Text(s.clone()),
  }
}

pub fn encode_doc(record: &Value) -> Result<String> { Ok(serde_json::to_string(record)?) }

pub fn decode_doc(doc: &str) -> Result<Value> { Ok(serde_json::from_str(doc)?) }

/// The SQLite value `json_extract` yields for a JSON scalar, so an index
/// query compares like with like. Booleans extract as 0/1.
pub fn encode_query_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => SqlValue::Integer(i),
      None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    // json_extract returns arrays and objects as minified JSON text.
    other => SqlValue::Text(other.to_string()),
  }
}

/// The expression indexed for `field`; must match the DDL in `schema.rs`.
pub fn index_expr(field: &str) -> String { format!("json_extract(doc, '$.{field}')") }

pub fn table(collection: Collection) -> &'static str { collection.name() }
