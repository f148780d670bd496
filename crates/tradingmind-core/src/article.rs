//! Saved articles and their highlights.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
  clock,
  collection::{Collection, Document},
};

/// Title used when a page has neither `<title>` nor `<h1>`.
pub const UNTITLED: &str = "Untitled Article";

/// A saved web page. `url` is unique across the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:         Option<String>,
  pub url:        String,
  pub title:      String,
  /// Raw HTML as fetched.
  pub content:    String,
  pub plain_text: String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    with = "crate::clock::iso_millis::option"
  )]
  pub saved_at:   Option<DateTime<Utc>>,
  /// Ids of highlights made in this article.
  #[serde(default)]
  pub highlights: Vec<String>,
  #[serde(default)]
  pub tags:       Vec<String>,
}

impl Document for Article {
  const COLLECTION: Collection = Collection::Articles;
}

impl Article {
  /// Build an unsaved article from fetched HTML.
  ///
  /// The title falls back to the page's `<title>`, then its first `<h1>`,
  /// then [`UNTITLED`].
  pub fn from_html(url: impl Into<String>, title: Option<&str>, html: impl Into<String>) -> Self {
    let content = html.into();
    let title = title
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(str::to_owned)
      .or_else(|| element_text(&TITLE_ELEMENT, &content))
      .or_else(|| element_text(&H1_ELEMENT, &content))
      .unwrap_or_else(|| UNTITLED.to_owned());

    Self {
      id: None,
      url: url.into(),
      title,
      plain_text: html_to_text(&content),
      content,
      saved_at: None,
      highlights: Vec::new(),
      tags: Vec::new(),
    }
  }
}

/// A highlighted passage of an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
  pub id:         String,
  pub article_id: String,
  pub text:       String,
  #[serde(default)]
  pub note:       Option<String>,
  #[serde(with = "crate::clock::iso_millis")]
  pub created_at: DateTime<Utc>,
}

impl Document for Highlight {
  const COLLECTION: Collection = Collection::Highlights;
}

impl Highlight {
  pub fn new(article_id: impl Into<String>, text: impl Into<String>) -> Self {
    Self {
      id:         format!("hl_{}", clock::next_millis()),
      article_id: article_id.into(),
      text:       text.into(),
      note:       None,
      created_at: clock::now(),
    }
  }
}

// ─── HTML to text ────────────────────────────────────────────────────────────

static TITLE_ELEMENT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is valid"));
static H1_ELEMENT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("h1 pattern is valid"));
static HEAD_ELEMENT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?is)<head[^>]*>.*?</head>").expect("head pattern is valid"));
static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<!--.*?-->")
    .expect("script pattern is valid")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

fn element_text(pattern: &Regex, html: &str) -> Option<String> {
  let inner = pattern.captures(html)?.get(1)?.as_str();
  let text = html_to_text(inner);
  (!text.is_empty()).then_some(text)
}

/// Reduce HTML to its visible body text: drop the head, scripts, styles,
/// comments and tags, decode common entities and collapse whitespace.
pub fn html_to_text(html: &str) -> String {
  let body = HEAD_ELEMENT.replace_all(html, " ");
  let body = SCRIPT_OR_STYLE.replace_all(&body, " ");
  let body = TAG.replace_all(&body, " ");
  let body = decode_entities(&body);
  WHITESPACE.replace_all(&body, " ").trim().to_owned()
}

fn decode_entities(text: &str) -> String {
  text
    .replace("&nbsp;", " ")
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&#39;", "'")
    .replace("&apos;", "'")
    .replace("&amp;", "&")
}
