//! `tradingmind`: capture trading notes tagged with `$TICKERS`.
//!
//! # Usage
//!
//! ```text
//! tradingmind capture add '$NVDA holding the 50dma' --category idea --timeframe swing
//! tradingmind capture list --unprocessed
//! tradingmind capture promote 1718000000000
//! tradingmind compose --category news < notes.txt
//! tradingmind article save https://example.com/fed --html fed.html
//! ```
//!
//! Settings come from `tradingmind.toml` (or `--config`) and `TRADINGMIND_*`
//! environment variables.

mod app;
mod draft;
mod render;
mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use app::{App, Edit};
use clap::{Parser, Subcommand};
use render::Printer;
use settings::AppConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tradingmind_core::{
  collections::Storage,
  local::{DraftCache, LocalStore},
  tickers::extract_tickers,
};
use tradingmind_store_sqlite::SqliteStore;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  name = "tradingmind",
  author,
  version,
  about = "Capture trading notes tagged with $TICKERS"
)]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tradingmind.toml", env = "TRADINGMIND_CONFIG")]
  config: PathBuf,

  /// Print records as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Commit, list and manage captures.
  #[command(subcommand)]
  Capture(CaptureCommand),

  /// Type a capture line by line on stdin; drafts are saved as you go and
  /// the capture is committed at end of input.
  Compose {
    #[arg(long)]
    category:  Option<String>,
    #[arg(long)]
    timeframe: Option<String>,
  },

  #[command(subcommand)]
  Note(NoteCommand),

  #[command(subcommand)]
  Article(ArticleCommand),

  #[command(subcommand)]
  Draft(DraftCommand),

  /// Print the tickers found in TEXT.
  Tickers { text: String },

  /// Print every stored record of COLLECTION (captures, notes, articles or
  /// highlights) as JSON.
  Dump { collection: String },
}

#[derive(Subcommand, Debug)]
enum CaptureCommand {
  Add {
    text:      String,
    #[arg(long)]
    category:  String,
    /// Only kept for the `idea` category.
    #[arg(long)]
    timeframe: Option<String>,
    /// PNG or JPEG file to attach (up to 4).
    #[arg(long = "image", value_name = "PATH")]
    images:    Vec<PathBuf>,
  },
  List {
    #[arg(long)]
    unprocessed: bool,
  },
  Edit {
    id:        i64,
    text:      String,
    #[arg(long)]
    category:  Option<String>,
    #[arg(long)]
    timeframe: Option<String>,
  },
  Delete {
    id: i64,
  },
  /// Turn a capture into a note and mark it processed.
  Promote {
    id: i64,
  },
}

#[derive(Subcommand, Debug)]
enum NoteCommand {
  Add {
    content: String,
    #[arg(long)]
    title:   String,
    #[arg(long = "tag")]
    tags:    Vec<String>,
  },
  List,
  Delete {
    id: String,
  },
}

#[derive(Subcommand, Debug)]
enum ArticleCommand {
  /// Save a page already fetched to disk.
  Save {
    url:   String,
    #[arg(long, value_name = "FILE")]
    html:  PathBuf,
    #[arg(long)]
    title: Option<String>,
  },
  List,
  Show {
    url: String,
  },
  Highlight {
    article_id: String,
    text:       String,
    #[arg(long)]
    note:       Option<String>,
  },
  Delete {
    id: String,
  },
}

#[derive(Subcommand, Debug)]
enum DraftCommand {
  Show,
  Clear,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
    .init();

  let cli = Cli::parse();
  let printer = Printer { json: cli.json };

  // Needs no storage.
  if let Command::Tickers { text } = &cli.command {
    return printer.tickers(&extract_tickers(text));
  }

  let cfg = AppConfig::load(&cli.config)?;
  std::fs::create_dir_all(&cfg.data_dir)
    .with_context(|| format!("failed to create data dir {}", cfg.data_dir.display()))?;

  let db_path = cfg.database_path();
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;
  let local = LocalStore::open(cfg.local_dir())
    .with_context(|| format!("failed to open local store at {:?}", cfg.local_dir()))?;

  let app = App::new(Storage::new(store), DraftCache::new(local), cfg.draft_debounce());
  run(&app, printer, cli.command).await
}

/// `info` unless `directives` (from `RUST_LOG`) say otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
  EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .parse_lossy(directives.unwrap_or_default())
}

async fn run(app: &App, printer: Printer, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Capture(cmd) => run_capture(app, printer, cmd).await,
    Command::Compose { category, timeframe } => {
      let stdin = tokio::io::BufReader::new(tokio::io::stdin());
      match app.compose(stdin, category, timeframe).await? {
        Some(capture) => printer.capture(&capture),
        None => {
          eprintln!("Nothing to capture.");
          Ok(())
        }
      }
    }
    Command::Note(cmd) => match cmd {
      NoteCommand::Add { content, title, tags } => {
        printer.note(&app.add_note(&title, &content, tags).await?)
      }
      NoteCommand::List => printer.notes(&app.notes().await),
      NoteCommand::Delete { id } => app.delete_note(&id).await,
    },
    Command::Article(cmd) => match cmd {
      ArticleCommand::Save { url, html, title } => {
        let html = std::fs::read_to_string(&html)
          .with_context(|| format!("reading {}", html.display()))?;
        let article = app.save_article(&url, &html, title.as_deref()).await?;
        printer.articles(std::slice::from_ref(&article))
      }
      ArticleCommand::List => printer.articles(&app.articles().await),
      ArticleCommand::Show { url } => match app.article(&url).await? {
        Some((article, highlights)) => printer.article(&article, &highlights),
        None => bail!("no saved article for {url}"),
      },
      ArticleCommand::Highlight { article_id, text, note } => {
        printer.highlight(&app.highlight(&article_id, &text, note).await?)
      }
      ArticleCommand::Delete { id } => app.delete_article(&id).await,
    },
    Command::Draft(cmd) => match cmd {
      DraftCommand::Show => printer.draft(app.draft().as_ref()),
      DraftCommand::Clear => {
        if !app.clear_draft() {
          bail!("failed to clear draft");
        }
        Ok(())
      }
    },
    Command::Tickers { text } => printer.tickers(&extract_tickers(&text)),
    Command::Dump { collection } => printer.records(&app.records(&collection).await?),
  }
}

async fn run_capture(app: &App, printer: Printer, cmd: CaptureCommand) -> anyhow::Result<()> {
  match cmd {
    CaptureCommand::Add { text, category, timeframe, images } => {
      let capture = app.commit(&text, Some(&category), timeframe, &images).await?;
      printer.capture(&capture)
    }
    CaptureCommand::List { unprocessed } => printer.captures(&app.captures(unprocessed).await),
    CaptureCommand::Edit { id, text, category, timeframe } => {
      match app.edit_capture(id, &text, category, timeframe).await? {
        Edit::Updated(capture) => printer.capture(&capture),
        Edit::Unchanged(capture) => {
          eprintln!("No changes.");
          printer.capture(&capture)
        }
        Edit::NotFound => bail!("no capture with id {id}"),
      }
    }
    CaptureCommand::Delete { id } => app.delete_capture(id).await,
    CaptureCommand::Promote { id } => match app.promote(id).await? {
      Some(promotion) => printer.note(&promotion.note),
      None => bail!("capture {id} does not exist or was already promoted"),
    },
  }
}
