//! The `DocumentStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `tradingmind-store-sqlite`). The typed collections in
//! [`collections`](crate::collections) and the front end depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde_json::Value;

use crate::collection::{Collection, IndexQuery, RecordId};

/// Collection-agnostic access to a versioned document database.
///
/// Records are JSON objects keyed by their `id` field. Each operation runs in
/// its own short transaction scoped to one collection; there is no atomicity
/// across collections or across calls.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// Insert `record`, or fully replace the record with the same id. Returns
  /// the stored record.
  ///
  /// Fails if the record has no valid id, or if the write is aborted (for
  /// example by a unique index violation).
  fn save(
    &self,
    collection: Collection,
    record: Value,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + '_;

  /// Point lookup. Returns `None` if no record has this id.
  fn get(
    &self,
    collection: Collection,
    id: RecordId,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + '_;

  /// Every record in the collection, in insertion order, optionally
  /// restricted to an equality match on a declared secondary index.
  fn get_all(
    &self,
    collection: Collection,
    index: Option<IndexQuery>,
  ) -> impl Future<Output = Result<Vec<Value>, Self::Error>> + Send + '_;

  /// Remove the record with this id. Succeeds whether or not it existed.
  fn delete(
    &self,
    collection: Collection,
    id: RecordId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
