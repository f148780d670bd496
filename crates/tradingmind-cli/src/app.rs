//! Application state and the operations behind each command.
//!
//! Read paths log failures and fall back to an empty result so listing never
//! aborts; write paths return errors so the user can retry.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};
use tracing::{error, info, warn};
use tradingmind_core::{
  article::{Article, Highlight},
  capture::{Capture, CaptureImage},
  clock,
  collection::{Collection, IndexQuery},
  collections::{Promotion, Storage},
  local::{Draft, DraftCache},
  note::Note,
  store::DocumentStore as _,
};
use tradingmind_store_sqlite::SqliteStore;

use crate::draft::DraftWriter;

/// Result of editing a capture.
#[derive(Debug)]
pub enum Edit {
  NotFound,
  /// Nothing differed from the stored capture; no write happened.
  Unchanged(Capture),
  Updated(Capture),
}

pub struct App {
  storage:     Storage<SqliteStore>,
  drafts:      Arc<DraftCache>,
  draft_delay: Duration,
}

impl App {
  pub fn new(storage: Storage<SqliteStore>, drafts: DraftCache, draft_delay: Duration) -> Self {
    Self { storage, drafts: Arc::new(drafts), draft_delay }
  }

  // ── Captures ────────────────────────────────────────────────────────────

  /// Commit a new capture. Text and category are required. The draft is
  /// cleared only once the capture is stored.
  pub async fn commit(
    &self,
    text: &str,
    category: Option<&str>,
    timeframe: Option<String>,
    images: &[PathBuf],
  ) -> Result<Capture> {
    let text = text.trim();
    if text.is_empty() {
      bail!("nothing to capture");
    }
    let Some(category) = category.filter(|c| !c.trim().is_empty()) else {
      bail!("a category is required to commit a capture");
    };

    let mut capture = Capture::new(text)
      .with_category(category.trim())
      .with_timeframe(timeframe);
    for path in images {
      capture.attach_image(load_image(path)?)?;
    }

    let capture = self.storage.captures().save(capture).await.inspect_err(|e| {
      error!(error = %e, "failed to commit capture; draft kept for retry");
    })?;

    self.drafts.clear();
    info!(capture_id = ?capture.id, tickers = ?capture.tickers, "committed capture");
    Ok(capture)
  }

  /// Read lines from `input`, persisting a debounced draft as they arrive,
  /// and commit the accumulated text at end of input.
  ///
  /// An existing draft is resumed: its text is prepended and its category
  /// and timeframe fill in any not given.
  pub async fn compose<R: AsyncBufRead + Unpin>(
    &self,
    input: R,
    category: Option<String>,
    timeframe: Option<String>,
  ) -> Result<Option<Capture>> {
    let mut text = String::new();
    let (mut category, mut timeframe) = (category, timeframe);
    if let Some(draft) = self.drafts.get() {
      info!(len = draft.text.len(), "resuming draft");
      text = draft.text;
      category = category.or(draft.category);
      timeframe = timeframe.or(draft.timeframe);
    }

    let mut writer = DraftWriter::new(Arc::clone(&self.drafts), self.draft_delay);
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("reading input")? {
      if !text.is_empty() {
        text.push('\n');
      }
      text.push_str(&line);
      writer.input(Draft::new(text.clone(), category.clone(), timeframe.clone()));
    }

    if text.trim().is_empty() {
      writer.cancel().await;
      return Ok(None);
    }

    // Persist now so a failed commit leaves the draft for the next attempt.
    writer.flush().await;
    self
      .commit(&text, category.as_deref(), timeframe, &[])
      .await
      .map(Some)
  }

  /// Replace a capture's text (and optionally category and timeframe),
  /// keeping its id, timestamp and images.
  pub async fn edit_capture(
    &self,
    id: i64,
    text: &str,
    category: Option<String>,
    timeframe: Option<String>,
  ) -> Result<Edit> {
    let captures = self.storage.captures();
    let Some(mut capture) = captures.get(id).await? else {
      return Ok(Edit::NotFound);
    };

    let text = text.trim();
    let category = category.map(|c| c.to_lowercase()).or(capture.category.clone());
    let timeframe = timeframe.map(|t| t.to_lowercase()).or(capture.timeframe.clone());
    if text == capture.text.trim()
      && category == capture.category
      && timeframe == capture.timeframe
    {
      return Ok(Edit::Unchanged(capture));
    }
    if text.is_empty() {
      bail!("a capture cannot be edited to be empty");
    }

    capture.set_text(text);
    capture.category = category;
    capture.timeframe = timeframe;
    capture.updated_at = Some(clock::now());

    let capture = captures.save(capture).await?;
    info!(capture_id = id, "updated capture");
    Ok(Edit::Updated(capture))
  }

  pub async fn delete_capture(&self, id: i64) -> Result<()> {
    self.storage.captures().delete(id).await?;
    info!(capture_id = id, "deleted capture");
    Ok(())
  }

  pub async fn promote(&self, id: i64) -> Result<Option<Promotion>> {
    Ok(self.storage.promote_capture(id).await?)
  }

  pub async fn captures(&self, only_unprocessed: bool) -> Vec<Capture> {
    self
      .storage
      .captures()
      .get_all(only_unprocessed)
      .await
      .unwrap_or_else(|e| {
        error!(error = %e, "failed to load captures");
        Vec::new()
      })
  }

  // ── Notes ───────────────────────────────────────────────────────────────

  pub async fn add_note(&self, title: &str, content: &str, tags: Vec<String>) -> Result<Note> {
    let mut note = Note::new(title.trim(), content);
    note.tags = tags;
    let note = self.storage.notes().save(note).await?;
    info!(note_id = ?note.id, "saved note");
    Ok(note)
  }

  pub async fn notes(&self) -> Vec<Note> {
    self.storage.notes().get_all().await.unwrap_or_else(|e| {
      error!(error = %e, "failed to load notes");
      Vec::new()
    })
  }

  pub async fn delete_note(&self, id: &str) -> Result<()> {
    self.storage.notes().delete(id).await?;
    Ok(())
  }

  // ── Articles ────────────────────────────────────────────────────────────

  /// Save fetched HTML as an article. A URL that is already saved is
  /// refused.
  pub async fn save_article(&self, url: &str, html: &str, title: Option<&str>) -> Result<Article> {
    let url = url.trim();
    if url.is_empty() {
      bail!("an article needs a URL");
    }
    let article = self
      .storage
      .articles()
      .save_new(Article::from_html(url, title, html))
      .await?;
    info!(article_id = ?article.id, url, "saved article");
    Ok(article)
  }

  pub async fn articles(&self) -> Vec<Article> {
    self.storage.articles().get_all().await.unwrap_or_else(|e| {
      error!(error = %e, "failed to load articles");
      Vec::new()
    })
  }

  /// The article saved from `url` with its highlights.
  pub async fn article(&self, url: &str) -> Result<Option<(Article, Vec<Highlight>)>> {
    let Some(article) = self.storage.articles().get_by_url(url).await? else {
      return Ok(None);
    };
    let highlights = match &article.id {
      Some(id) => {
        self
          .storage
          .find_documents(IndexQuery::new("articleId", id.as_str()))
          .await?
      }
      None => Vec::new(),
    };
    Ok(Some((article, highlights)))
  }

  pub async fn highlight(
    &self,
    article_id: &str,
    text: &str,
    note: Option<String>,
  ) -> Result<Highlight> {
    if self.storage.articles().get(article_id).await?.is_none() {
      bail!("no article with id {article_id}");
    }
    let mut highlight = Highlight::new(article_id, text.trim());
    highlight.note = note;
    Ok(self.storage.save_document(&highlight).await?)
  }

  pub async fn delete_article(&self, id: &str) -> Result<()> {
    self.storage.articles().delete(id).await?;
    Ok(())
  }

  // ── Drafts ──────────────────────────────────────────────────────────────

  pub fn draft(&self) -> Option<Draft> { self.drafts.get() }

  pub fn clear_draft(&self) -> bool { self.drafts.clear() }

  // ── Raw records ─────────────────────────────────────────────────────────

  /// Every stored record of the collection called `name`, in insertion order.
  pub async fn records(&self, name: &str) -> Result<Vec<serde_json::Value>> {
    let collection = Collection::parse(name)?;
    Ok(self.storage.store().get_all(collection, None).await?)
  }
}

/// Read an image file and embed it. The MIME type comes from the extension.
fn load_image(path: &Path) -> Result<CaptureImage> {
  let mime = match path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .as_deref()
  {
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    other => {
      warn!(path = %path.display(), extension = ?other, "unsupported image type");
      "application/octet-stream"
    }
  };
  let bytes =
    std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string());
  Ok(CaptureImage::from_bytes(name, mime, &bytes)?)
}
