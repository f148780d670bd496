//! SQL schema for the TradingMind SQLite store.
//!
//! Executed at connection startup, after which `PRAGMA user_version` is set to
//! [`SCHEMA_VERSION`]; a database written by a newer version is refused.

/// Version stamped into `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// `id` is declared without a type so integer and text keys keep their type
/// (`1` and `'1'` are different records). Index names must match
/// `Collection::indexes`, and each index expression must match the one used
/// in queries for SQLite to use it.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS captures (
    id   PRIMARY KEY NOT NULL,
    doc  TEXT NOT NULL           -- JSON document, including its id
);
CREATE INDEX IF NOT EXISTS captures_timestamp ON captures (json_extract(doc, '$.timestamp'));
CREATE INDEX IF NOT EXISTS captures_processed ON captures (json_extract(doc, '$.processed'));

CREATE TABLE IF NOT EXISTS notes (
    id   PRIMARY KEY NOT NULL,
    doc  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS notes_createdAt ON notes (json_extract(doc, '$.createdAt'));
CREATE INDEX IF NOT EXISTS notes_updatedAt ON notes (json_extract(doc, '$.updatedAt'));

CREATE TABLE IF NOT EXISTS articles (
    id   PRIMARY KEY NOT NULL,
    doc  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS articles_savedAt ON articles (json_extract(doc, '$.savedAt'));
CREATE UNIQUE INDEX IF NOT EXISTS articles_url ON articles (json_extract(doc, '$.url'));

CREATE TABLE IF NOT EXISTS highlights (
    id   PRIMARY KEY NOT NULL,
    doc  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS highlights_articleId ON highlights (json_extract(doc, '$.articleId'));
CREATE INDEX IF NOT EXISTS highlights_createdAt ON highlights (json_extract(doc, '$.createdAt'));
";
