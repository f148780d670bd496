//! Collection names, index definitions and record identity.
//!
//! The store is document-oriented: every record is a JSON object whose `id`
//! field is its primary key within one named collection. Secondary indexes
//! are equality lookups over a single top-level field.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

// ─── Collection ──────────────────────────────────────────────────────────────

/// One of the fixed collections of the store. The string form is the
/// persisted collection name.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
  Captures,
  Notes,
  Articles,
  Highlights,
}

/// A secondary index over one top-level document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
  /// Index name; identical to the indexed field name.
  pub name:   &'static str,
  pub unique: bool,
}

const fn index(name: &'static str) -> IndexSpec { IndexSpec { name, unique: false } }

const CAPTURE_INDEXES: &[IndexSpec] = &[index("timestamp"), index("processed")];
const NOTE_INDEXES: &[IndexSpec] = &[index("createdAt"), index("updatedAt")];
const ARTICLE_INDEXES: &[IndexSpec] =
  &[index("savedAt"), IndexSpec { name: "url", unique: true }];
const HIGHLIGHT_INDEXES: &[IndexSpec] = &[index("articleId"), index("createdAt")];

impl Collection {
  /// The persisted collection name, e.g. `"captures"`.
  pub fn name(self) -> &'static str { self.into() }

  /// Secondary indexes declared for this collection.
  pub fn indexes(self) -> &'static [IndexSpec] {
    match self {
      Self::Captures => CAPTURE_INDEXES,
      Self::Notes => NOTE_INDEXES,
      Self::Articles => ARTICLE_INDEXES,
      Self::Highlights => HIGHLIGHT_INDEXES,
    }
  }

  /// Look up a declared index by name.
  pub fn index(self, name: &str) -> Result<&'static IndexSpec> {
    self
      .indexes()
      .iter()
      .find(|spec| spec.name == name)
      .ok_or_else(|| Error::UnknownIndex {
        collection: self,
        index:      name.to_owned(),
      })
  }

  /// Parse a collection from its persisted name.
  pub fn parse(name: &str) -> Result<Self> {
    Self::from_str(name).map_err(|_| Error::UnknownCollection(name.to_owned()))
  }
}

// ─── RecordId ────────────────────────────────────────────────────────────────

/// The primary key of a record: an integer (captures) or a non-empty string
/// (everything else). Integer `1` and string `"1"` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
  Int(i64),
  Text(String),
}

impl RecordId {
  /// Extract and validate the `id` field of a JSON record.
  pub fn of(record: &Value) -> Result<Self> {
    let obj = record
      .as_object()
      .ok_or_else(|| Error::InvalidRecord("record is not a JSON object".into()))?;
    match obj.get("id") {
      Some(Value::Number(n)) => n
        .as_i64()
        .map(Self::Int)
        .ok_or_else(|| Error::InvalidRecord(format!("id {n} is not an integer"))),
      Some(Value::String(s)) if !s.is_empty() => Ok(Self::Text(s.clone())),
      Some(Value::String(_)) => Err(Error::InvalidRecord("id is empty".into())),
      Some(other) => Err(Error::InvalidRecord(format!("unsupported id {other}"))),
      None => Err(Error::InvalidRecord("record has no id".into())),
    }
  }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Int(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

/// Command-line friendly parsing: anything that parses as an integer is an
/// integer key.
impl FromStr for RecordId {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    Ok(
      s.parse::<i64>()
        .map(Self::Int)
        .unwrap_or_else(|_| Self::Text(s.to_owned())),
    )
  }
}

impl From<i64> for RecordId {
  fn from(n: i64) -> Self { Self::Int(n) }
}

impl From<String> for RecordId {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<&str> for RecordId {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

// ─── IndexQuery ──────────────────────────────────────────────────────────────

/// An equality match against a named secondary index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
  pub index: String,
  pub value: Value,
}

impl IndexQuery {
  pub fn new(index: impl Into<String>, value: impl Into<Value>) -> Self {
    Self { index: index.into(), value: value.into() }
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A typed record that lives in a fixed collection.
pub trait Document: Serialize + DeserializeOwned + Send {
  const COLLECTION: Collection;
}

/// Serialise a typed record into the JSON form handed to the store.
pub fn to_record<D: Serialize>(doc: &D) -> Result<Value> { Ok(serde_json::to_value(doc)?) }

/// Deserialise a stored JSON record into its typed form.
pub fn from_record<D: DeserializeOwned>(record: Value) -> Result<D> {
  Ok(serde_json::from_value(record)?)
}
