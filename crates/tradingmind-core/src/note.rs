//! Notes: longer-form writing, created directly or promoted from a capture.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  capture::Capture,
  collection::{Collection, Document},
  tickers::extract_tickers,
};

/// Tag attached to notes promoted from a capture.
pub const FROM_CAPTURE_TAG: &str = "from-capture";

/// A note. `id` (`note_…`) and `createdAt` are stamped on first save;
/// `updatedAt` is rewritten on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:           Option<String>,
  pub title:        String,
  pub content:      String,
  #[serde(default)]
  pub tickers:      Vec<String>,
  /// Ids of articles this note refers to; informational only.
  #[serde(default)]
  pub article_refs: Vec<String>,
  #[serde(default)]
  pub tags:         Vec<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    with = "crate::clock::iso_millis::option"
  )]
  pub created_at:   Option<DateTime<Utc>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    with = "crate::clock::iso_millis::option"
  )]
  pub updated_at:   Option<DateTime<Utc>>,
}

impl Document for Note {
  const COLLECTION: Collection = Collection::Notes;
}

impl Note {
  /// A new, unsaved note with tickers extracted from its content.
  pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
    let content = content.into();
    Self {
      id: None,
      title: title.into(),
      tickers: extract_tickers(&content),
      content,
      article_refs: Vec::new(),
      tags: Vec::new(),
      created_at: None,
      updated_at: None,
    }
  }

  /// Derive a note from a capture, dated `on` (the local calendar day).
  pub fn from_capture(capture: &Capture, on: NaiveDate) -> Self {
    Self {
      id: None,
      title: format!("Note from capture - {}", on.format("%-m/%-d/%Y")),
      content: capture.text.clone(),
      tickers: capture.tickers.clone(),
      article_refs: Vec::new(),
      tags: vec![FROM_CAPTURE_TAG.to_owned()],
      created_at: None,
      updated_at: None,
    }
  }
}
