//! Integration tests for `SqliteStore` and the typed collections against an
//! in-memory database.

use std::time::Duration;

use serde_json::json;
use tradingmind_core::{
  Error as CoreError,
  article::{Article, Highlight},
  capture::Capture,
  collection::{Collection, IndexQuery, RecordId},
  collections::Storage,
  note::{FROM_CAPTURE_TAG, Note},
  store::DocumentStore,
};

use crate::{Error, SCHEMA_VERSION, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn storage() -> Storage<SqliteStore> { Storage::new(store().await) }

// ─── Generic store ───────────────────────────────────────────────────────────

#[tokio::test]
async fn save_and_get_record() {
  let s = store().await;
  let record = json!({ "id": 1, "text": "$AAPL", "processed": false });

  let saved = s.save(Collection::Captures, record.clone()).await.unwrap();
  assert_eq!(saved, record);

  let fetched = s.get(Collection::Captures, RecordId::Int(1)).await.unwrap();
  assert_eq!(fetched, Some(record));
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  let result = s.get(Collection::Notes, RecordId::from("note_0")).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn saving_same_id_twice_overwrites() {
  let s = store().await;
  s.save(Collection::Captures, json!({ "id": 1, "text": "first" }))
    .await
    .unwrap();
  s.save(Collection::Captures, json!({ "id": 1, "text": "x" }))
    .await
    .unwrap();

  let all = s.get_all(Collection::Captures, None).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0]["id"], 1);
  assert_eq!(all[0]["text"], "x");
}

#[tokio::test]
async fn integer_and_string_keys_are_distinct() {
  let s = store().await;
  s.save(Collection::Notes, json!({ "id": 1, "v": "int" })).await.unwrap();
  s.save(Collection::Notes, json!({ "id": "1", "v": "text" })).await.unwrap();

  let all = s.get_all(Collection::Notes, None).await.unwrap();
  assert_eq!(all.len(), 2);
  let text = s.get(Collection::Notes, RecordId::from("1")).await.unwrap().unwrap();
  assert_eq!(text["v"], "text");
}

#[tokio::test]
async fn get_all_keeps_insertion_order_across_replacements() {
  let s = store().await;
  for id in [30, 10, 20] {
    s.save(Collection::Captures, json!({ "id": id })).await.unwrap();
  }
  s.save(Collection::Captures, json!({ "id": 30, "edited": true }))
    .await
    .unwrap();

  let ids: Vec<i64> = s
    .get_all(Collection::Captures, None)
    .await
    .unwrap()
    .iter()
    .map(|r| r["id"].as_i64().unwrap())
    .collect();
  assert_eq!(ids, [30, 10, 20]);
}

#[tokio::test]
async fn collections_are_isolated() {
  let s = store().await;
  s.save(Collection::Captures, json!({ "id": 1 })).await.unwrap();
  assert!(s.get_all(Collection::Notes, None).await.unwrap().is_empty());
  assert!(s.get(Collection::Notes, RecordId::Int(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn records_without_valid_ids_are_rejected() {
  let s = store().await;
  for record in [json!({ "text": "no id" }), json!({ "id": "" }), json!("scalar")] {
    let err = s.save(Collection::Notes, record).await.unwrap_err();
    assert!(matches!(err, Error::Core(CoreError::InvalidRecord(_))), "{err}");
  }
  assert!(s.get_all(Collection::Notes, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_is_idempotent() {
  let s = store().await;
  s.save(Collection::Captures, json!({ "id": 1 })).await.unwrap();

  s.delete(Collection::Captures, RecordId::Int(99)).await.unwrap();
  assert_eq!(s.get_all(Collection::Captures, None).await.unwrap().len(), 1);

  s.delete(Collection::Captures, RecordId::Int(1)).await.unwrap();
  s.delete(Collection::Captures, RecordId::Int(1)).await.unwrap();
  assert!(s.get_all(Collection::Captures, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn index_equality_filter() {
  let s = store().await;
  s.save(Collection::Captures, json!({ "id": 1, "processed": false }))
    .await
    .unwrap();
  s.save(Collection::Captures, json!({ "id": 2, "processed": true }))
    .await
    .unwrap();
  s.save(Collection::Captures, json!({ "id": 3, "processed": false }))
    .await
    .unwrap();

  let open = s
    .get_all(Collection::Captures, Some(IndexQuery::new("processed", false)))
    .await
    .unwrap();
  let ids: Vec<_> = open.iter().map(|r| r["id"].as_i64().unwrap()).collect();
  assert_eq!(ids, [1, 3]);

  let done = s
    .get_all(Collection::Captures, Some(IndexQuery::new("processed", true)))
    .await
    .unwrap();
  assert_eq!(done.len(), 1);
  assert_eq!(done[0]["id"], 2);
}

#[tokio::test]
async fn unknown_index_is_rejected() {
  let s = store().await;
  let err = s
    .get_all(Collection::Notes, Some(IndexQuery::new("url", "x")))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::UnknownIndex { collection: Collection::Notes, .. })
  ));
}

#[tokio::test]
async fn duplicate_article_url_aborts_the_write() {
  let s = store().await;
  s.save(Collection::Articles, json!({ "id": "art_1", "url": "https://a.example" }))
    .await
    .unwrap();

  let err = s
    .save(Collection::Articles, json!({ "id": "art_2", "url": "https://a.example" }))
    .await
    .unwrap_err();
  assert!(err.is_write_error(), "{err}");
  assert!(matches!(err, Error::Write { collection: Collection::Articles, .. }));

  // Replacing the same record with the same URL is fine.
  s.save(
    Collection::Articles,
    json!({ "id": "art_1", "url": "https://a.example", "title": "t" }),
  )
  .await
  .unwrap();
  assert_eq!(s.get_all(Collection::Articles, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn highlights_by_article() {
  let storage = storage().await;
  let first = Highlight::new("art_1", "rates on hold");
  let second = Highlight::new("art_2", "guidance raised");
  let third = Highlight::new("art_1", "dots unchanged");
  for h in [&first, &second, &third] {
    storage.save_document(h).await.unwrap();
  }

  let found: Vec<Highlight> = storage
    .find_documents(IndexQuery::new("articleId", "art_1"))
    .await
    .unwrap();
  assert_eq!(found, [first, third]);
}

// ─── Open / schema ───────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_a_file_keeps_data() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tm.db");

  let s = SqliteStore::open(&path).await.unwrap();
  s.save(Collection::Notes, json!({ "id": "note_1", "title": "kept" }))
    .await
    .unwrap();
  drop(s);

  let s = SqliteStore::open(&path).await.unwrap();
  let note = s.get(Collection::Notes, RecordId::from("note_1")).await.unwrap();
  assert_eq!(note.unwrap()["title"], "kept");
}

#[tokio::test]
async fn open_stamps_the_schema_version() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tm.db");
  drop(SqliteStore::open(&path).await.unwrap());

  let conn = rusqlite::Connection::open(&path).unwrap();
  let version: i64 = conn
    .query_row("PRAGMA user_version", [], |row| row.get(0))
    .unwrap();
  assert_eq!(version, SCHEMA_VERSION);
}

#[tokio::test]
async fn newer_schema_is_unavailable() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("future.db");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .pragma_update(None, "user_version", SCHEMA_VERSION + 1)
      .unwrap();
  }

  let err = SqliteStore::open(&path).await.unwrap_err();
  assert!(err.is_unavailable(), "{err}");
  assert!(matches!(err, Error::SchemaTooNew { .. }));
}

#[tokio::test]
async fn unopenable_path_is_unavailable() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("missing-dir").join("tm.db");
  let err = SqliteStore::open(&path).await.unwrap_err();
  assert!(err.is_unavailable(), "{err}");
}

// ─── Captures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn capture_save_stamps_defaults() {
  let storage = storage().await;
  let saved = storage
    .captures()
    .save(Capture::new("$AAPL breaking out").with_category("news"))
    .await
    .unwrap();

  assert!(saved.id.is_some());
  assert!(saved.timestamp.is_some());
  assert!(!saved.processed);
  assert_eq!(saved.tickers, ["AAPL"]);

  let fetched = storage.captures().get(saved.id.unwrap()).await.unwrap();
  assert_eq!(fetched, Some(saved));
}

#[tokio::test]
async fn capture_save_normalises_tickers_and_timeframe() {
  let storage = storage().await;
  let mut capture = Capture::new("free text")
    .with_category("news")
    .with_timeframe(Some("swing".into()));
  capture.tickers = vec!["SPY".into(), "spy".into(), "SPY".into(), "TOOLONG".into()];

  let saved = storage.captures().save(capture).await.unwrap();
  assert_eq!(saved.tickers, ["SPY"]);
  assert_eq!(saved.timeframe, None);

  let idea = storage
    .captures()
    .save(
      Capture::new("$SPY bounce")
        .with_category("idea")
        .with_timeframe(Some("swing".into())),
    )
    .await
    .unwrap();
  assert_eq!(idea.timeframe.as_deref(), Some("swing"));
}

#[tokio::test]
async fn rapid_captures_get_distinct_ids() {
  let storage = storage().await;
  for n in 0..20 {
    storage
      .captures()
      .save(Capture::new(format!("note {n}")))
      .await
      .unwrap();
  }
  assert_eq!(storage.captures().get_all(false).await.unwrap().len(), 20);
}

#[tokio::test]
async fn edit_keeps_id_and_images() {
  let storage = storage().await;
  let mut capture = Capture::new("$TSLA chart").with_category("news");
  capture
    .attach_image(
      tradingmind_core::capture::CaptureImage::from_bytes("c.png", "image/png", b"png")
        .unwrap(),
    )
    .unwrap();
  let saved = storage.captures().save(capture).await.unwrap();

  let mut edited = storage.captures().get(saved.id.unwrap()).await.unwrap().unwrap();
  edited.set_text("$TSLA and $RIVN chart");
  let edited = storage.captures().save(edited).await.unwrap();

  assert_eq!(edited.id, saved.id);
  assert_eq!(edited.timestamp, saved.timestamp);
  assert_eq!(edited.images, saved.images);
  assert_eq!(edited.tickers, ["TSLA", "RIVN"]);
  assert_eq!(storage.captures().get_all(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn captures_sorted_newest_first_and_filtered() {
  let storage = storage().await;
  let base = chrono::Utc::now();
  for (id, minutes, processed) in [(1, 0, false), (2, 20, true), (3, 10, false)] {
    let mut c = Capture::new(format!("c{id}"));
    c.id = Some(id);
    c.timestamp = Some(base + chrono::Duration::minutes(minutes));
    c.processed = processed;
    storage.captures().save(c).await.unwrap();
  }

  let all: Vec<_> = storage
    .captures()
    .get_all(false)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.id.unwrap())
    .collect();
  assert_eq!(all, [2, 3, 1]);

  let open: Vec<_> = storage
    .captures()
    .get_all(true)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.id.unwrap())
    .collect();
  assert_eq!(open, [3, 1]);
}

#[tokio::test]
async fn mark_processed_flips_flag() {
  let storage = storage().await;
  let saved = storage.captures().save(Capture::new("$AMD")).await.unwrap();
  let id = saved.id.unwrap();

  let marked = storage.captures().mark_processed(id).await.unwrap().unwrap();
  assert!(marked.processed);
  assert_eq!(marked.text, "$AMD");
  assert!(storage.captures().get(id).await.unwrap().unwrap().processed);
}

#[tokio::test]
async fn mark_processed_missing_is_noop() {
  let storage = storage().await;
  let result = storage.captures().mark_processed(12345).await.unwrap();
  assert!(result.is_none());
  assert!(storage.captures().get_all(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_missing_capture_leaves_collection_unchanged() {
  let storage = storage().await;
  storage.captures().save(Capture::new("keep")).await.unwrap();
  storage.captures().delete(424242).await.unwrap();
  assert_eq!(storage.captures().get_all(false).await.unwrap().len(), 1);
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn note_save_stamps_and_refreshes_updated_at() {
  let storage = storage().await;
  let saved = storage
    .notes()
    .save(Note::new("Thesis", "$NVDA supply chain"))
    .await
    .unwrap();

  let id = saved.id.clone().unwrap();
  assert!(id.starts_with("note_"));
  let created = saved.created_at.unwrap();
  assert!(saved.updated_at.unwrap() >= created);

  tokio::time::sleep(Duration::from_millis(5)).await;
  let resaved = storage.notes().save(saved).await.unwrap();
  assert_eq!(resaved.id.as_deref(), Some(id.as_str()));
  assert_eq!(resaved.created_at, Some(created));
  assert!(resaved.updated_at.unwrap() > created);
}

#[tokio::test]
async fn note_updated_at_never_precedes_created_at() {
  let storage = storage().await;
  let mut note = Note::new("future", "");
  let future = chrono::Utc::now() + chrono::Duration::hours(1);
  note.created_at = Some(future);
  let saved = storage.notes().save(note).await.unwrap();
  assert_eq!(saved.updated_at, Some(future));
}

#[tokio::test]
async fn notes_sorted_by_most_recent_update() {
  let storage = storage().await;
  let mut ids = Vec::new();
  for title in ["t1", "t2", "t3"] {
    let note = storage.notes().save(Note::new(title, "")).await.unwrap();
    ids.push(note.id.unwrap());
    tokio::time::sleep(Duration::from_millis(5)).await;
  }

  let titles: Vec<_> = storage
    .notes()
    .get_all()
    .await
    .unwrap()
    .into_iter()
    .map(|n| n.title)
    .collect();
  assert_eq!(titles, ["t3", "t2", "t1"]);

  // Touching the oldest moves it to the front.
  let oldest = storage.notes().get(&ids[0]).await.unwrap().unwrap();
  storage.notes().save(oldest).await.unwrap();
  let first = storage.notes().get_all().await.unwrap().remove(0);
  assert_eq!(first.title, "t1");
}

#[tokio::test]
async fn note_delete() {
  let storage = storage().await;
  let note = storage.notes().save(Note::new("gone", "")).await.unwrap();
  storage.notes().delete(note.id.as_deref().unwrap()).await.unwrap();
  storage.notes().delete("note_missing").await.unwrap();
  assert!(storage.notes().get_all().await.unwrap().is_empty());
}

// ─── Articles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_by_url() {
  let storage = storage().await;
  let url = "https://example.com/fed";
  assert!(storage.articles().get_by_url(url).await.unwrap().is_none());

  let saved = storage
    .articles()
    .save(Article::from_html(url, None, "<title>Fed</title><p>hold</p>"))
    .await
    .unwrap();
  assert!(saved.id.as_deref().unwrap().starts_with("art_"));
  assert!(saved.saved_at.is_some());

  let found = storage.articles().get_by_url(url).await.unwrap();
  assert_eq!(found, Some(saved));
  assert!(
    storage
      .articles()
      .get_by_url("https://example.com/other")
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn save_new_rejects_known_url() {
  let storage = storage().await;
  let url = "https://example.com/cpi";
  storage
    .articles()
    .save_new(Article::from_html(url, Some("CPI"), "<p>hot</p>"))
    .await
    .unwrap();

  let err = storage
    .articles()
    .save_new(Article::from_html(url, Some("CPI again"), "<p>hot</p>"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DuplicateUrl(u)) if u == url));

  // Bypassing the check still hits the unique index.
  let err = storage
    .articles()
    .save(Article::from_html(url, Some("CPI again"), "<p>hot</p>"))
    .await
    .unwrap_err();
  assert!(err.is_write_error());
  assert_eq!(storage.articles().get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn articles_sorted_newest_first() {
  let storage = storage().await;
  for n in 0..3 {
    let title = format!("a{n}");
    storage
      .articles()
      .save(Article::from_html(format!("https://e.com/{n}"), Some(title.as_str()), ""))
      .await
      .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
  }
  let titles: Vec<_> = storage
    .articles()
    .get_all()
    .await
    .unwrap()
    .into_iter()
    .map(|a| a.title)
    .collect();
  assert_eq!(titles, ["a2", "a1", "a0"]);
}

// ─── Promotion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn promote_capture_creates_note_and_marks_processed() {
  let storage = storage().await;
  let capture = storage
    .captures()
    .save(Capture::new("$META capex up").with_category("news"))
    .await
    .unwrap();
  let id = capture.id.unwrap();

  let promotion = storage.promote_capture(id).await.unwrap().unwrap();
  assert!(promotion.capture.processed);
  assert_eq!(promotion.note.content, "$META capex up");
  assert_eq!(promotion.note.tickers, ["META"]);
  assert_eq!(promotion.note.tags, [FROM_CAPTURE_TAG]);
  assert!(promotion.note.title.starts_with("Note from capture - "));

  assert!(storage.captures().get(id).await.unwrap().unwrap().processed);
  assert_eq!(storage.notes().get_all().await.unwrap().len(), 1);
  assert!(storage.captures().get_all(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn promoting_twice_creates_one_note() {
  let storage = storage().await;
  let capture = storage.captures().save(Capture::new("$SPY")).await.unwrap();
  let id = capture.id.unwrap();

  assert!(storage.promote_capture(id).await.unwrap().is_some());
  assert!(storage.promote_capture(id).await.unwrap().is_none());
  assert_eq!(storage.notes().get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn promoting_missing_capture_writes_nothing() {
  let storage = storage().await;
  assert!(storage.promote_capture(1).await.unwrap().is_none());
  assert!(storage.notes().get_all().await.unwrap().is_empty());
}
