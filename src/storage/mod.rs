//! Storage layer for the skill corpus
//!
//! Documents on disk are the source of truth; SQLite holds the rebuildable
//! index (metadata, FTS5 entries, embedding cache).

pub mod migrations;
pub mod sqlite;
pub mod store;

pub use sqlite::Database;
pub use store::{CorpusStore, DEFAULT_DATABASE, INDEX_SUMMARY, RebuildReport};
