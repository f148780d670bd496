//! Error types for `tradingmind-core`.

use thiserror::Error;

use crate::collection::Collection;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown collection: {0:?}")]
  UnknownCollection(String),

  #[error("collection {collection} has no index named {index:?}")]
  UnknownIndex {
    collection: Collection,
    index:      String,
  },

  /// The record is not an object or lacks a usable `id`.
  #[error("invalid record: {0}")]
  InvalidRecord(String),

  #[error("image rejected: {0}")]
  ImageRejected(String),

  #[error("an article for {0} is already saved")]
  DuplicateUrl(String),

  #[error("local storage error: {0}")]
  Local(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
