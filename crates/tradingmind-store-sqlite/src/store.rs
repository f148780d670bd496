//! [`SqliteStore`], the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use serde_json::Value;
use tracing::{debug, info};

use tradingmind_core::{
  collection::{Collection, IndexQuery, RecordId},
  store::DocumentStore,
};

use crate::{
  Error, Result,
  encode::{decode_doc, encode_doc, encode_id, encode_query_value, index_expr, table},
  schema::{SCHEMA, SCHEMA_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for SqliteStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteStore").finish_non_exhaustive()
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  ///
  /// Fails with [`Error::Unavailable`] or [`Error::SchemaTooNew`] when the
  /// database cannot be used.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::Unavailable)?;
    let store = Self { conn };
    store.init_schema().await?;
    info!(path = %path.display(), "opened document store");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::Unavailable)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let found: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?))
      .await
      .map_err(Error::Unavailable)?;

    if found > SCHEMA_VERSION {
      return Err(Error::SchemaTooNew { found, supported: SCHEMA_VERSION });
    }

    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
      })
      .await
      .map_err(Error::Unavailable)?;

    if found < SCHEMA_VERSION {
      info!(from = found, to = SCHEMA_VERSION, "upgraded schema");
    }
    Ok(())
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn save(&self, collection: Collection, record: Value) -> Result<Value> {
    let id = encode_id(&RecordId::of(&record)?);
    let doc = encode_doc(&record)?;
    let sql = format!(
      "INSERT INTO {} (id, doc) VALUES (?1, ?2)
       ON CONFLICT (id) DO UPDATE SET doc = excluded.doc",
      table(collection)
    );

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![id, doc])?;
        Ok(())
      })
      .await
      .map_err(|source| Error::Write { collection, source })?;

    Ok(record)
  }

  async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Value>> {
    let key = encode_id(&id);
    let sql = format!("SELECT doc FROM {} WHERE id = ?1", table(collection));

    let doc: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![key], |row| row.get(0))
            .optional()?,
        )
      })
      .await?;

    doc.as_deref().map(decode_doc).transpose()
  }

  async fn get_all(
    &self,
    collection: Collection,
    index: Option<IndexQuery>,
  ) -> Result<Vec<Value>> {
    // Resolve the index before touching the database so an unknown name is
    // reported as such rather than as an SQL error.
    let filter = index
      .map(|q| {
        collection
          .index(&q.index)
          .map(|spec| (index_expr(spec.name), encode_query_value(&q.value)))
      })
      .transpose()?;

    let docs: Vec<String> = self
      .conn
      .call(move |conn| {
        let docs = match filter {
          Some((expr, value)) => {
            let sql = format!(
              "SELECT doc FROM {} WHERE {expr} = ?1 ORDER BY rowid",
              table(collection)
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt
              .query_map(rusqlite::params![value], |row| row.get(0))?
              .collect::<rusqlite::Result<Vec<String>>>()?
          }
          None => {
            let sql = format!("SELECT doc FROM {} ORDER BY rowid", table(collection));
            let mut stmt = conn.prepare(&sql)?;
            stmt
              .query_map([], |row| row.get(0))?
              .collect::<rusqlite::Result<Vec<String>>>()?
          }
        };
        Ok(docs)
      })
      .await?;

    docs.iter().map(|doc| decode_doc(doc)).collect()
  }

  async fn delete(&self, collection: Collection, id: RecordId) -> Result<()> {
    let key = encode_id(&id);
    let sql = format!("DELETE FROM {} WHERE id = ?1", table(collection));

    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![key])?))
      .await
      .map_err(|source| Error::Write { collection, source })?;

    debug!(%collection, %id, removed, "delete");
    Ok(())
  }
}
