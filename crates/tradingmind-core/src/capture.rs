//! Captures: short timestamped notes tagged with tickers.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  collection::{Collection, Document},
  tickers::extract_tickers,
};

/// The only category for which a timeframe is meaningful.
pub const IDEA_CATEGORY: &str = "idea";

/// Most images a single capture may carry.
pub const MAX_IMAGES: usize = 4;

/// Largest accepted image payload, in bytes.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types accepted for attached images.
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg"];

// ─── Images ──────────────────────────────────────────────────────────────────

/// An image embedded in a capture. Never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureImage {
  pub id:         String,
  /// Display name, usually the original file name.
  pub name:       String,
  /// Full payload as a `data:` URL.
  pub full_image: String,
  /// Thumbnail payload as a `data:` URL.
  pub thumbnail:  String,
  /// Size of the decoded full payload in bytes.
  pub size:       u64,
  #[serde(rename = "type")]
  pub mime_type:  String,
}

impl CaptureImage {
  /// Build an image from raw bytes. The thumbnail is the full payload;
  /// resizing is left to whoever renders it.
  pub fn from_bytes(
    name: impl Into<String>,
    mime_type: &str,
    bytes: &[u8],
  ) -> Result<Self> {
    let name = name.into();
    let mime_type = mime_type.to_ascii_lowercase();
    if !ACCEPTED_IMAGE_TYPES.contains(&mime_type.as_str()) {
      return Err(Error::ImageRejected(format!(
        "{name}: only PNG or JPEG images are accepted, got {mime_type}"
      )));
    }
    let size = bytes.len() as u64;
    if size > MAX_IMAGE_BYTES {
      return Err(Error::ImageRejected(format!(
        "{name} is too large ({size} bytes, max {MAX_IMAGE_BYTES})"
      )));
    }

    let data_url = format!("data:{mime_type};base64,{}", STANDARD.encode(bytes));
    Ok(Self {
      id: format!("img_{}", Uuid::new_v4().simple()),
      name,
      thumbnail: data_url.clone(),
      full_image: data_url,
      size,
      mime_type,
    })
  }
}

// ─── Capture ─────────────────────────────────────────────────────────────────

/// A freeform note committed from the capture box.
///
/// `id` and `timestamp` are stamped by
/// [`Captures::save`](crate::collections::Captures::save) when absent. To
/// update a capture, fetch it and save the modified record so both are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:         Option<i64>,
  pub text:       String,
  #[serde(default)]
  pub tickers:    Vec<String>,
  #[serde(default)]
  pub category:   Option<String>,
  /// Only meaningful for the `idea` category.
  #[serde(default)]
  pub timeframe:  Option<String>,
  #[serde(default)]
  pub images:     Vec<CaptureImage>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    with = "crate::clock::iso_millis::option"
  )]
  pub timestamp:  Option<DateTime<Utc>>,
  /// Set once the capture has been promoted into a note.
  #[serde(default)]
  pub processed:  bool,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    with = "crate::clock::iso_millis::option"
  )]
  pub updated_at: Option<DateTime<Utc>>,
}

impl Document for Capture {
  const COLLECTION: Collection = Collection::Captures;
}

impl Capture {
  /// A new, unsaved capture with tickers extracted from `text`.
  pub fn new(text: impl Into<String>) -> Self {
    let text = text.into();
    Self {
      id: None,
      tickers: extract_tickers(&text),
      text,
      category: None,
      timeframe: None,
      images: Vec::new(),
      timestamp: None,
      processed: false,
      updated_at: None,
    }
  }

  pub fn with_category(mut self, category: impl Into<String>) -> Self {
    self.category = Some(category.into().to_lowercase());
    self
  }

  pub fn with_timeframe(mut self, timeframe: Option<String>) -> Self {
    self.timeframe = timeframe.map(|t| t.to_lowercase());
    self
  }

  /// Replace the text and refresh the ticker set from it.
  pub fn set_text(&mut self, text: impl Into<String>) {
    self.text = text.into();
    self.tickers = extract_tickers(&self.text);
  }

  pub fn is_idea(&self) -> bool { self.category.as_deref() == Some(IDEA_CATEGORY) }

  /// Attach an image, enforcing the per-capture limit.
  pub fn attach_image(&mut self, image: CaptureImage) -> Result<()> {
    if self.images.len() >= MAX_IMAGES {
      return Err(Error::ImageRejected(format!(
        "a capture holds at most {MAX_IMAGES} images"
      )));
    }
    self.images.push(image);
    Ok(())
  }

  /// Badge shown next to the capture, e.g. `IDEA - SWING`.
  pub fn badge(&self) -> Option<String> {
    let category = self.category.as_deref()?;
    let mut badge = category.to_uppercase();
    if self.is_idea()
      && let Some(timeframe) = &self.timeframe
    {
      badge.push_str(" - ");
      badge.push_str(&timeframe.to_uppercase());
    }
    Some(badge)
  }
}
