//! Runtime configuration.
//!
//! Layered from an optional TOML file and `TRADINGMIND_*` environment
//! variables (e.g. `TRADINGMIND_DATA_DIR`), over built-in defaults.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Directory holding the database and the draft store. `~` is expanded.
  #[serde(default = "default_data_dir")]
  pub data_dir:          PathBuf,
  /// Database file name, relative to `data_dir`.
  #[serde(default = "default_database")]
  pub database:          String,
  /// Quiet period after the last input before a draft is written.
  #[serde(default = "default_draft_debounce_ms")]
  pub draft_debounce_ms: u64,
}

fn default_data_dir() -> PathBuf { PathBuf::from("~/.local/share/tradingmind") }

fn default_database() -> String { "tradingmind.db".to_string() }

fn default_draft_debounce_ms() -> u64 { 300 }

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      data_dir:          default_data_dir(),
      database:          default_database(),
      draft_debounce_ms: default_draft_debounce_ms(),
    }
  }
}

impl AppConfig {
  /// Load from `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("TRADINGMIND"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;
    cfg.data_dir = expand_tilde(&cfg.data_dir);
    Ok(cfg)
  }

  pub fn database_path(&self) -> PathBuf { self.data_dir.join(&self.database) }

  /// Directory of the key-value store holding drafts.
  pub fn local_dir(&self) -> PathBuf { self.data_dir.join("local") }

  pub fn draft_debounce(&self) -> Duration { Duration::from_millis(self.draft_debounce_ms) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
