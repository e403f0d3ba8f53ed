use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use crate::core::{SkillKind, SkillRecord};
use crate::error::Result;
use crate::search::{HybridRetriever, SemanticIndex};
use crate::storage::CorpusStore;

/// Date every fixture record is created on
pub const FIXTURE_DATE: (i32, u32, u32) = (2026, 1, 15);

/// Isolated memory root with an open store.
pub struct CorpusFixture {
    pub temp_dir: TempDir,
    pub store: Arc<CorpusStore>,
}

impl CorpusFixture {
    /// Store with the hash embedder enabled.
    pub fn new() -> Result<Self> {
        Self::with_semantic(SemanticIndex::hashed(64))
    }

    /// Store with no semantic backend.
    pub fn lexical_only() -> Result<Self> {
        Self::with_semantic(SemanticIndex::disabled())
    }

    pub fn with_semantic(semantic: SemanticIndex) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let store = Arc::new(CorpusStore::open(temp_dir.path(), semantic)?);
        Ok(Self { temp_dir, store })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Retriever with default weights over this store.
    #[must_use]
    pub fn retriever(&self) -> HybridRetriever {
        HybridRetriever::new(Arc::clone(&self.store))
    }

    /// Write a raw document into a partition, bypassing the store.
    pub fn write_document(&self, partition: &str, file_name: &str, text: &str) -> Result<PathBuf> {
        let dir = self.root().join(partition);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        std::fs::write(&path, text)?;
        Ok(path)
    }

    /// Upsert every record, in order.
    pub fn insert_all(&self, records: &[SkillRecord]) -> Result<()> {
        for record in records {
            self.store.upsert(record)?;
        }
        Ok(())
    }
}

/// Global skill record created on [`FIXTURE_DATE`].
#[must_use]
pub fn record(skill_id: &str, kind: SkillKind, tags: &[&str], content: &str) -> SkillRecord {
    let (y, m, d) = FIXTURE_DATE;
    SkillRecord::new(
        skill_id,
        kind,
        tags.iter().map(|tag| (*tag).to_string()).collect(),
        "fixture-project",
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        content,
    )
}
