//! Synchronous key-value storage for small, ephemeral values.
//!
//! [`LocalStore`] keeps one JSON file per key in a directory. It is
//! independent of the document database and its async lifecycle, so it can
//! be written from any input handler. [`DraftCache`] uses it to hold the
//! in-progress capture.

use std::{
  fs,
  io::{self, Write as _},
  path::{Path, PathBuf},
};

use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Result;

// ─── LocalStore ──────────────────────────────────────────────────────────────

/// A directory of JSON values addressed by key.
#[derive(Debug, Clone)]
pub struct LocalStore {
  dir: PathBuf,
}

impl LocalStore {
  /// Use `dir` for storage, creating it if needed.
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    fs::create_dir_all(&dir)?;
    Ok(Self { dir })
  }

  /// File holding `key`.
  ///
  /// Lowercase ASCII letters, digits and `-` are kept as is. Every other byte
  /// of the key, `_` included, is written as `_` and two hex digits, so no two
  /// keys share a file, even on case-insensitive file systems.
  fn path(&self, key: &str) -> PathBuf {
    let mut file = String::with_capacity(key.len());
    for b in key.bytes() {
      if b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' {
        file.push(char::from(b));
      } else {
        file.push_str(&format!("_{b:02x}"));
      }
    }
    self.dir.join(format!("{file}.json"))
  }

  /// Store `value` under `key`, replacing any previous value.
  ///
  /// The value is written to a temporary file of its own and renamed into
  /// place, so a reader never sees a partial write and concurrent writers
  /// never share a file.
  pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
    let path = self.path(key);
    let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
    let bytes = serde_json::to_vec(value)?;
    let written = write_synced(&tmp, &bytes).and_then(|()| fs::rename(&tmp, &path));
    if written.is_err() {
      let _ = fs::remove_file(&tmp);
    }
    written?;
    Ok(())
  }

  /// The value stored under `key`, or `None` if there is none.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    match fs::read(self.path(key)) {
      Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  /// Remove `key`. Removing a missing key succeeds.
  pub fn remove(&self, key: &str) -> Result<()> {
    match fs::remove_file(self.path(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
  let mut file = fs::File::create(path)?;
  file.write_all(bytes)?;
  file.sync_all()
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// Key holding the in-progress capture.
pub const DRAFT_KEY: &str = "capture_draft";

/// The capture being typed but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
  pub text:      String,
  #[serde(default)]
  pub category:  Option<String>,
  #[serde(default)]
  pub timeframe: Option<String>,
  /// When the draft was saved, in milliseconds since the epoch.
  pub timestamp: i64,
}

impl Draft {
  pub fn new(
    text: impl Into<String>,
    category: Option<String>,
    timeframe: Option<String>,
  ) -> Self {
    Self {
      text: text.into(),
      category,
      timeframe,
      timestamp: Utc::now().timestamp_millis(),
    }
  }
}

/// Last-write-wins storage for a single [`Draft`].
///
/// Failures are logged and reported as `false`/`None`; losing a draft never
/// interrupts input.
#[derive(Debug, Clone)]
pub struct DraftCache {
  local: LocalStore,
}

impl DraftCache {
  pub fn new(local: LocalStore) -> Self { Self { local } }

  /// Persist `draft`. Drafts with blank text are not saved.
  pub fn save(&self, draft: &Draft) -> bool {
    if draft.text.trim().is_empty() {
      debug!("skipping blank draft");
      return false;
    }
    match self.local.save(DRAFT_KEY, draft) {
      Ok(()) => {
        debug!(len = draft.text.len(), "draft saved");
        true
      }
      Err(e) => {
        warn!(error = %e, "failed to save draft");
        false
      }
    }
  }

  pub fn get(&self) -> Option<Draft> {
    self.local.get(DRAFT_KEY).unwrap_or_else(|e| {
      warn!(error = %e, "failed to read draft");
      None
    })
  }

  pub fn clear(&self) -> bool {
    match self.local.remove(DRAFT_KEY) {
      Ok(()) => true,
      Err(e) => {
        warn!(error = %e, "failed to remove draft");
        false
      }
    }
  }
}
