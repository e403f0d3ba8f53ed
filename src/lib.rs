//! Skill memory engine
//!
//! A persistent corpus of reusable knowledge units ("skills": patterns,
//! gotchas, decisions) kept as markdown documents with YAML frontmatter and
//! indexed in SQLite for hybrid lexical + semantic retrieval. Corpus
//! analytics find near-duplicates, stale entries and promotion candidates.

pub mod advisory;
pub mod analytics;
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod search;
pub mod storage;
pub mod test_utils;
pub mod utils;

pub use error::{MemoryError, Result};
