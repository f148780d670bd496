//! Terminal output for records.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tradingmind_core::{
  article::{Article, Highlight},
  capture::Capture,
  local::Draft,
  note::Note,
};

/// Prints records either as text or as pretty JSON.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
  pub json: bool,
}

impl Printer {
  fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
  }

  pub fn captures(&self, captures: &[Capture]) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(captures);
    }
    if captures.is_empty() {
      println!("No captures yet.");
    }
    for capture in captures {
      self.capture_text(capture);
    }
    Ok(())
  }

  pub fn capture(&self, capture: &Capture) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(capture);
    }
    self.capture_text(capture);
    Ok(())
  }

  fn capture_text(&self, capture: &Capture) {
    let mut header = format!(
      "#{}  {}",
      capture.id.map(|id| id.to_string()).unwrap_or_default(),
      stamp(capture.timestamp)
    );
    if let Some(badge) = capture.badge() {
      header.push_str(&format!("  [{badge}]"));
    }
    if !capture.tickers.is_empty() {
      header.push_str("  ");
      header.push_str(&dollar_tickers(&capture.tickers));
    }
    if capture.processed {
      header.push_str("  (processed)");
    }
    println!("{header}");
    for line in capture.text.lines() {
      println!("    {line}");
    }
    if !capture.images.is_empty() {
      let names: Vec<_> = capture.images.iter().map(|i| i.name.as_str()).collect();
      println!("    images: {}", names.join(", "));
    }
  }

  pub fn notes(&self, notes: &[Note]) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(notes);
    }
    if notes.is_empty() {
      println!("No notes yet.");
    }
    for note in notes {
      self.note_text(note);
    }
    Ok(())
  }

  pub fn note(&self, note: &Note) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(note);
    }
    self.note_text(note);
    Ok(())
  }

  fn note_text(&self, note: &Note) {
    println!(
      "{}  {}  (updated {})",
      note.id.as_deref().unwrap_or_default(),
      note.title,
      stamp(note.updated_at)
    );
    if !note.tickers.is_empty() {
      println!("    {}", dollar_tickers(&note.tickers));
    }
    if !note.tags.is_empty() {
      println!("    tags: {}", note.tags.join(", "));
    }
    for line in note.content.lines() {
      println!("    {line}");
    }
  }

  pub fn articles(&self, articles: &[Article]) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(articles);
    }
    if articles.is_empty() {
      println!("No saved articles.");
    }
    for article in articles {
      println!(
        "{}  {}  {}  (saved {})",
        article.id.as_deref().unwrap_or_default(),
        article.title,
        article.url,
        stamp(article.saved_at)
      );
    }
    Ok(())
  }

  pub fn article(&self, article: &Article, highlights: &[Highlight]) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(&serde_json::json!({
        "article": article,
        "highlights": highlights,
      }));
    }
    println!("{}", article.title);
    println!("{}", article.url);
    println!("saved {}", stamp(article.saved_at));
    println!();
    println!("{}", article.plain_text);
    for highlight in highlights {
      println!();
      println!("> {}", highlight.text);
      if let Some(note) = &highlight.note {
        println!("  {note}");
      }
    }
    Ok(())
  }

  pub fn highlight(&self, highlight: &Highlight) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(highlight);
    }
    println!("{}  > {}", highlight.id, highlight.text);
    Ok(())
  }

  pub fn draft(&self, draft: Option<&Draft>) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(&draft);
    }
    match draft {
      Some(d) => {
        let saved = DateTime::<Utc>::from_timestamp_millis(d.timestamp);
        let mut header = format!("Draft saved {}", stamp(saved));
        if let Some(category) = &d.category {
          header.push_str(&format!("  [{category}]"));
        }
        if let Some(timeframe) = &d.timeframe {
          header.push_str(&format!("  ({timeframe})"));
        }
        println!("{header}");
        println!("{}", d.text);
      }
      None => println!("No draft."),
    }
    Ok(())
  }

  /// Raw records are always printed as JSON.
  pub fn records(&self, records: &[serde_json::Value]) -> anyhow::Result<()> {
    self.print_json(records)
  }

  pub fn tickers(&self, tickers: &[String]) -> anyhow::Result<()> {
    if self.json {
      return self.print_json(tickers);
    }
    if tickers.is_empty() {
      println!("No tickers.");
    } else {
      println!("Tickers: {}", dollar_tickers(tickers));
    }
    Ok(())
  }
}

fn stamp(at: Option<DateTime<Utc>>) -> String {
  at.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|| "-".to_string())
}

fn dollar_tickers(tickers: &[String]) -> String {
  tickers
    .iter()
    .map(|t| format!("${t}"))
    .collect::<Vec<_>>()
    .join(", ")
}
