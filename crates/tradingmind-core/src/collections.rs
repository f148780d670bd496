//! Typed collections over a [`DocumentStore`], and the [`Storage`] context
//! that owns the store.
//!
//! Each collection stamps identity and timestamp fields when they are absent
//! and applies its own ordering on reads. Filtering and sorting happen after
//! a full fetch.

use chrono::Local;
use tracing::{debug, info, warn};

use crate::{
  Error,
  article::Article,
  capture::Capture,
  clock,
  collection::{Collection, Document, IndexQuery, RecordId, from_record, to_record},
  note::Note,
  store::DocumentStore,
  tickers,
};

// ─── Storage context ─────────────────────────────────────────────────────────

/// The storage context handed to everything that reads or writes records.
///
/// Constructed once by the entry point from an opened store.
#[derive(Debug, Clone)]
pub struct Storage<S> {
  store: S,
}

/// The outcome of promoting a capture into a note.
#[derive(Debug, Clone)]
pub struct Promotion {
  pub note:    Note,
  pub capture: Capture,
}

impl<S: DocumentStore> Storage<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// The generic store, for collections without a typed wrapper.
  pub fn store(&self) -> &S { &self.store }

  pub fn captures(&self) -> Captures<'_, S> { Captures { store: &self.store } }

  pub fn notes(&self) -> Notes<'_, S> { Notes { store: &self.store } }

  pub fn articles(&self) -> Articles<'_, S> { Articles { store: &self.store } }

  /// Save a fully-formed document into its collection.
  pub async fn save_document<D: Document>(&self, doc: &D) -> Result<D, S::Error> {
    let stored = self.store.save(D::COLLECTION, to_record(doc)?).await?;
    Ok(from_record(stored)?)
  }

  /// Every document of type `D` matching an index equality query.
  pub async fn find_documents<D: Document>(
    &self,
    query: IndexQuery,
  ) -> Result<Vec<D>, S::Error> {
    let records = self.store.get_all(D::COLLECTION, Some(query)).await?;
    let docs = records
      .into_iter()
      .map(from_record)
      .collect::<crate::Result<Vec<D>>>()?;
    Ok(docs)
  }

  /// Turn a capture into a note and mark the capture processed.
  ///
  /// These are two separate writes with no rollback. If marking the capture
  /// fails, the note stays saved and the error is returned. A capture that is
  /// missing or already processed is left alone and `None` is returned, so
  /// retrying a promotion never creates a second note.
  pub async fn promote_capture(&self, id: i64) -> Result<Option<Promotion>, S::Error> {
    let Some(capture) = self.captures().get(id).await? else {
      debug!(capture_id = id, "promotion skipped: capture not found");
      return Ok(None);
    };
    if capture.processed {
      info!(capture_id = id, "promotion skipped: capture already processed");
      return Ok(None);
    }

    let note = self
      .notes()
      .save(Note::from_capture(&capture, Local::now().date_naive()))
      .await?;

    let capture = match self.captures().mark_processed(id).await {
      Ok(Some(marked)) => marked,
      Ok(None) => {
        warn!(capture_id = id, note_id = ?note.id, "capture vanished during promotion");
        capture
      }
      Err(e) => {
        warn!(
          capture_id = id,
          note_id = ?note.id,
          error = %e,
          "note saved but capture not marked processed"
        );
        return Err(e);
      }
    };

    info!(capture_id = id, note_id = ?note.id, "promoted capture to note");
    Ok(Some(Promotion { note, capture }))
  }
}

// ─── Captures ────────────────────────────────────────────────────────────────

pub struct Captures<'a, S> {
  store: &'a S,
}

impl<S: DocumentStore> Captures<'_, S> {
  /// Insert or replace a capture.
  ///
  /// Stamps `id` and `timestamp` when absent, drops malformed or duplicate
  /// tickers, and clears the timeframe unless the category is `idea`.
  pub async fn save(&self, mut capture: Capture) -> Result<Capture, S::Error> {
    capture.id.get_or_insert_with(clock::next_millis);
    capture.timestamp.get_or_insert_with(clock::now);
    capture.tickers = tickers::sanitize(std::mem::take(&mut capture.tickers));
    if !capture.is_idea() {
      capture.timeframe = None;
    }

    let stored = self
      .store
      .save(Collection::Captures, to_record(&capture)?)
      .await?;
    debug!(capture_id = ?capture.id, "saved capture");
    Ok(from_record(stored)?)
  }

  pub async fn get(&self, id: i64) -> Result<Option<Capture>, S::Error> {
    let record = self.store.get(Collection::Captures, RecordId::Int(id)).await?;
    Ok(record.map(from_record).transpose()?)
  }

  /// All captures, newest first; optionally only those not yet processed.
  pub async fn get_all(&self, only_unprocessed: bool) -> Result<Vec<Capture>, S::Error> {
    let records = self.store.get_all(Collection::Captures, None).await?;
    let mut captures = records
      .into_iter()
      .map(from_record)
      .collect::<crate::Result<Vec<Capture>>>()?;
    if only_unprocessed {
      captures.retain(|c| !c.processed);
    }
    captures.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(captures)
  }

  pub async fn delete(&self, id: i64) -> Result<(), S::Error> {
    self.store.delete(Collection::Captures, RecordId::Int(id)).await
  }

  /// Set `processed` on an existing capture. Returns `None`, writing
  /// nothing, if the capture does not exist.
  pub async fn mark_processed(&self, id: i64) -> Result<Option<Capture>, S::Error> {
    let Some(mut capture) = self.get(id).await? else {
      return Ok(None);
    };
    capture.processed = true;
    self.save(capture).await.map(Some)
  }
}

// ─── Notes ───────────────────────────────────────────────────────────────────

pub struct Notes<'a, S> {
  store: &'a S,
}

impl<S: DocumentStore> Notes<'_, S> {
  /// Insert or replace a note.
  ///
  /// Stamps `id` and `createdAt` when absent and always rewrites
  /// `updatedAt`, never earlier than `createdAt`.
  pub async fn save(&self, mut note: Note) -> Result<Note, S::Error> {
    note
      .id
      .get_or_insert_with(|| format!("note_{}", clock::next_millis()));
    let now = clock::now();
    let created_at = *note.created_at.get_or_insert(now);
    note.updated_at = Some(now.max(created_at));

    let stored = self.store.save(Collection::Notes, to_record(&note)?).await?;
    debug!(note_id = ?note.id, "saved note");
    Ok(from_record(stored)?)
  }

  pub async fn get(&self, id: &str) -> Result<Option<Note>, S::Error> {
    let record = self.store.get(Collection::Notes, RecordId::from(id)).await?;
    Ok(record.map(from_record).transpose()?)
  }

  /// All notes, most recently updated first.
  pub async fn get_all(&self) -> Result<Vec<Note>, S::Error> {
    let records = self.store.get_all(Collection::Notes, None).await?;
    let mut notes = records
      .into_iter()
      .map(from_record)
      .collect::<crate::Result<Vec<Note>>>()?;
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(notes)
  }

  pub async fn delete(&self, id: &str) -> Result<(), S::Error> {
    self.store.delete(Collection::Notes, RecordId::from(id)).await
  }
}

// ─── Articles ────────────────────────────────────────────────────────────────

pub struct Articles<'a, S> {
  store: &'a S,
}

impl<S: DocumentStore> Articles<'_, S> {
  /// Insert or replace an article. Stamps `id` and `savedAt` when absent.
  ///
  /// The store rejects a second article with an existing URL; use
  /// [`save_new`](Self::save_new) to check first.
  pub async fn save(&self, mut article: Article) -> Result<Article, S::Error> {
    article
      .id
      .get_or_insert_with(|| format!("art_{}", clock::next_millis()));
    article.saved_at.get_or_insert_with(clock::now);

    let stored = self
      .store
      .save(Collection::Articles, to_record(&article)?)
      .await?;
    debug!(article_id = ?article.id, url = %article.url, "saved article");
    Ok(from_record(stored)?)
  }

  /// Save an article whose URL is not stored yet.
  pub async fn save_new(&self, article: Article) -> Result<Article, S::Error> {
    if self.get_by_url(&article.url).await?.is_some() {
      return Err(Error::DuplicateUrl(article.url).into());
    }
    self.save(article).await
  }

  pub async fn get(&self, id: &str) -> Result<Option<Article>, S::Error> {
    let record = self.store.get(Collection::Articles, RecordId::from(id)).await?;
    Ok(record.map(from_record).transpose()?)
  }

  /// The article saved from `url`, if any.
  pub async fn get_by_url(&self, url: &str) -> Result<Option<Article>, S::Error> {
    let records = self
      .store
      .get_all(Collection::Articles, Some(IndexQuery::new("url", url)))
      .await?;
    Ok(records.into_iter().next().map(from_record).transpose()?)
  }

  /// All articles, most recently saved first.
  pub async fn get_all(&self) -> Result<Vec<Article>, S::Error> {
    let records = self.store.get_all(Collection::Articles, None).await?;
    let mut articles = records
      .into_iter()
      .map(from_record)
      .collect::<crate::Result<Vec<Article>>>()?;
    articles.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
    Ok(articles)
  }

  pub async fn delete(&self, id: &str) -> Result<(), S::Error> {
    self.store.delete(Collection::Articles, RecordId::from(id)).await
  }
}
