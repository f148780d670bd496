//! Error type for `tradingmind-store-sqlite`.

use thiserror::Error;
use tradingmind_core::collection::Collection;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tradingmind_core::Error),

  /// The database could not be opened or its schema applied.
  #[error("storage unavailable: {0}")]
  Unavailable(#[source] tokio_rusqlite::Error),

  #[error(
    "storage unavailable: database schema version {found} is newer than supported \
     version {supported}"
  )]
  SchemaTooNew { found: i64, supported: i64 },

  /// A write transaction was aborted, e.g. by a unique index violation.
  #[error("write to {collection} aborted: {source}")]
  Write {
    collection: Collection,
    #[source]
    source:     tokio_rusqlite::Error,
  },

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  /// Whether this error means the store could not be used at all.
  pub fn is_unavailable(&self) -> bool {
    matches!(self, Self::Unavailable(_) | Self::SchemaTooNew { .. })
  }

  /// Whether this error is an aborted write.
  pub fn is_write_error(&self) -> bool { matches!(self, Self::Write { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
