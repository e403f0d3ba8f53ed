//! Corpus store: skill documents on disk plus their SQLite index
//!
//! Every mutation takes the writer lock, writes the document, and applies
//! the metadata row, lexical entry and embedding entry inside one SQLite
//! transaction. Readers use pooled read-only connections and run inside a
//! read transaction, so under WAL they see either the state before a write
//! or after it.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::core::document::{self, PARTITIONS};
use crate::core::{SkillRecord, SkillStatus, extract_title, validate};
use crate::error::{MemoryError, Result};
use crate::search::semantic::{self, EmbedOutcome, SemanticIndex};
use crate::search::lexical;
use crate::storage::sqlite::Database;

/// Default database file name under the memory root
pub const DEFAULT_DATABASE: &str = "index.db";

/// Summary file written after a rebuild
pub const INDEX_SUMMARY: &str = "index.yaml";

/// Idle read connections kept for reuse
const MAX_IDLE_READERS: usize = 8;

const META_COLUMNS: &str = "skill_id, kind, domain_tags, scope, stack_context, created, \
     project_origin, verified_by, status, last_used, reuse_count, review_after, supersedes, \
     conflict_with, title, content, location";

/// Outcome of `CorpusStore::rebuild`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildReport {
    pub indexed: usize,
    /// Documents that could not be parsed
    pub skipped: Vec<PathBuf>,
    pub embedded: usize,
    /// Embeddings kept because the content hash was unchanged
    pub reused: usize,
    /// Embeddings dropped because their record is gone
    pub pruned: usize,
}

pub struct CorpusStore {
    root: PathBuf,
    db_path: PathBuf,
    writer: Mutex<Database>,
    readers: Mutex<Vec<Connection>>,
    semantic: SemanticIndex,
}

impl CorpusStore {
    /// Open the store rooted at `root` with the default database file.
    pub fn open(root: impl AsRef<Path>, semantic: SemanticIndex) -> Result<Self> {
        Self::open_with_database(root, DEFAULT_DATABASE, semantic)
    }

    pub fn open_with_database(
        root: impl AsRef<Path>,
        database: impl AsRef<Path>,
        semantic: SemanticIndex,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let db_path = root.join(database);
        let db = Database::open(&db_path)?;
        tracing::debug!(root = %root.display(), semantic = semantic.is_available(), "corpus store opened");

        Ok(Self {
            root,
            db_path,
            writer: Mutex::new(db),
            readers: Mutex::new(Vec::new()),
            semantic,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    #[must_use]
    pub fn semantic(&self) -> &SemanticIndex {
        &self.semantic
    }

    /// Run `f` against a read snapshot of the index.
    pub fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let pooled = self.readers.lock().pop();
        let conn = match pooled {
            Some(conn) => conn,
            None => Database::open_reader(&self.db_path)?,
        };

        let result = {
            let tx = conn.unchecked_transaction()?;
            f(&tx)
        };

        let mut idle = self.readers.lock();
        if idle.len() < MAX_IDLE_READERS {
            idle.push(conn);
        }
        result
    }

    /// Insert or replace a record. Returns the document location.
    pub fn upsert(&self, record: &SkillRecord) -> Result<PathBuf> {
        validate(record)?;
        let mut db = self.writer.lock();
        let mut records = vec![record.clone()];
        let mut paths = self.write_locked(&mut db, &mut records)?;
        tracing::info!(skill_id = %record.skill_id, kind = %record.kind, "skill upserted");
        Ok(paths.remove(0))
    }

    pub fn get(&self, skill_id: &str) -> Result<SkillRecord> {
        self.with_reader(|conn| fetch(conn, skill_id))?
            .ok_or_else(|| MemoryError::NotFound(skill_id.to_string()))
    }

    /// Remove a record, its index entries and its document. Unknown ids are fine.
    pub fn delete(&self, skill_id: &str) -> Result<()> {
        let mut db = self.writer.lock();
        let previous = location_of(db.conn(), skill_id)?;

        let tx = db.conn_mut().transaction()?;
        let removed = tx.execute("DELETE FROM skills_meta WHERE skill_id = ?", [skill_id])?;
        lexical::delete_entry(&tx, skill_id)?;
        semantic::delete_entry(&tx, skill_id)?;
        tx.commit()?;

        if let Some(path) = previous {
            document::remove(&path)?;
        }
        for partition in PARTITIONS {
            document::remove(&self.root.join(partition).join(format!("{skill_id}.md")))?;
        }
        if removed > 0 {
            tracing::info!(skill_id, "skill deleted");
        }
        Ok(())
    }

    /// Records with the given status, or every record when `None`.
    pub fn list(&self, status: Option<SkillStatus>) -> Result<Vec<SkillRecord>> {
        self.with_reader(|conn| match status {
            Some(status) => query_records(
                conn,
                &format!("SELECT {META_COLUMNS} FROM skills_meta WHERE status = ? ORDER BY skill_id"),
                [status.as_str()],
            ),
            None => query_records(
                conn,
                &format!("SELECT {META_COLUMNS} FROM skills_meta ORDER BY skill_id"),
                [],
            ),
        })
    }

    pub fn count(&self) -> Result<usize> {
        self.with_reader(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM skills_meta", [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        })
    }

    /// Drop every record and index entry. Documents on disk are untouched.
    pub fn clear(&self) -> Result<()> {
        let mut db = self.writer.lock();
        let tx = db.conn_mut().transaction()?;
        tx.execute("DELETE FROM skills_meta", [])?;
        lexical::clear(&tx)?;
        semantic::clear(&tx)?;
        tx.commit()?;
        tracing::info!("index cleared");
        Ok(())
    }

    /// Regenerate the index from the documents under the root.
    pub fn rebuild(&self) -> Result<RebuildReport> {
        let mut db = self.writer.lock();
        let scan = document::load_corpus(&self.root);
        let mut report = RebuildReport {
            skipped: scan.skipped,
            ..RebuildReport::default()
        };

        let tx = db.conn_mut().transaction()?;
        tx.execute("DELETE FROM skills_meta", [])?;
        lexical::clear(&tx)?;

        let mut indexed: BTreeMap<String, SkillRecord> = BTreeMap::new();
        for record in scan.records {
            if indexed.contains_key(&record.skill_id) {
                tracing::warn!(skill_id = %record.skill_id, path = ?record.location, "duplicate skill_id, later document wins");
            }
            match self.index_record(&tx, &record)? {
                EmbedOutcome::Embedded => report.embedded += 1,
                EmbedOutcome::Reused => report.reused += 1,
                EmbedOutcome::Skipped | EmbedOutcome::Degraded => {}
            }
            indexed.insert(record.skill_id.clone(), record);
        }
        report.pruned = semantic::prune_orphans(&tx)?;
        tx.commit()?;

        report.indexed = indexed.len();
        let indexed: Vec<SkillRecord> = indexed.into_values().collect();
        write_summary(&self.root, &indexed)?;

        tracing::info!(
            indexed = report.indexed,
            skipped = report.skipped.len(),
            embedded = report.embedded,
            reused = report.reused,
            "index rebuilt"
        );
        Ok(report)
    }

    /// Record a re-use: bump `reuse_count`, set `last_used`, and move
    /// `needs_review` back to `active`.
    pub fn record_use(&self, skill_id: &str, today: NaiveDate) -> Result<SkillRecord> {
        self.modify(&[skill_id], |record| {
            record.reuse_count = record.reuse_count.saturating_add(1);
            record.last_used = Some(today);
            if record.status == SkillStatus::NeedsReview {
                record.status = SkillStatus::Active;
            }
            Ok(())
        })
        .map(|mut records| records.remove(0))
    }

    pub fn set_status(&self, skill_id: &str, status: SkillStatus) -> Result<SkillRecord> {
        self.modify(&[skill_id], |record| {
            record.status = status;
            Ok(())
        })
        .map(|mut records| records.remove(0))
    }

    /// Move a record from `from` to `to`; a no-op returning `false` when the
    /// record is currently in any other status.
    pub fn transition_status(
        &self,
        skill_id: &str,
        from: SkillStatus,
        to: SkillStatus,
    ) -> Result<bool> {
        let mut db = self.writer.lock();
        let mut record = fetch(db.conn(), skill_id)?
            .ok_or_else(|| MemoryError::NotFound(skill_id.to_string()))?;
        if record.status != from {
            return Ok(false);
        }
        record.status = to;
        self.write_locked(&mut db, std::slice::from_mut(&mut record))?;
        tracing::info!(skill_id, from = %from, to = %to, "status changed");
        Ok(true)
    }

    /// Mark two records as contradicting each other.
    pub fn record_conflict(&self, a: &str, b: &str) -> Result<(SkillRecord, SkillRecord)> {
        if a == b {
            return Err(MemoryError::Validation(format!(
                "skill '{a}' cannot conflict with itself"
            )));
        }
        let mut records = self.modify(&[a, b], |record| {
            let other = if record.skill_id == a { b } else { a };
            record.status = SkillStatus::Conflicted;
            if !record.conflict_with.iter().any(|id| id == other) {
                record.conflict_with.push(other.to_string());
            }
            Ok(())
        })?;
        let second = records.remove(1);
        let first = records.remove(0);
        tracing::info!(a, b, "conflict recorded");
        Ok((first, second))
    }

    /// Read-modify-write of existing records under the writer lock.
    pub(crate) fn modify(
        &self,
        skill_ids: &[&str],
        mut change: impl FnMut(&mut SkillRecord) -> Result<()>,
    ) -> Result<Vec<SkillRecord>> {
        let mut db = self.writer.lock();
        let mut records = Vec::with_capacity(skill_ids.len());
        for skill_id in skill_ids {
            let mut record = fetch(db.conn(), skill_id)?
                .ok_or_else(|| MemoryError::NotFound((*skill_id).to_string()))?;
            change(&mut record)?;
            validate(&record)?;
            records.push(record);
        }
        self.write_locked(&mut db, &mut records)?;
        Ok(records)
    }

    /// Write documents, then apply all index writes in one transaction.
    fn write_locked(&self, db: &mut Database, records: &mut [SkillRecord]) -> Result<Vec<PathBuf>> {
        let mut previous = Vec::with_capacity(records.len());
        let mut paths = Vec::with_capacity(records.len());
        let mut created = Vec::with_capacity(records.len());
        for record in records.iter_mut() {
            record.title = extract_title(&record.content);
            previous.push(location_of(db.conn(), &record.skill_id)?);
            let target = self.root.join(record.relative_path());
            let existed = target.exists();
            let path = match document::write(&self.root, record) {
                Ok(path) => path,
                Err(err) => {
                    discard_created(&paths, &created);
                    return Err(err);
                }
            };
            created.push(!existed);
            record.location = Some(path.clone());
            paths.push(path);
        }

        if let Err(err) = self.commit_index(db, records) {
            discard_created(&paths, &created);
            return Err(err);
        }

        for (old, new) in previous.into_iter().zip(&paths) {
            if let Some(old) = old.filter(|old| old != new) {
                tracing::debug!(from = %old.display(), to = %new.display(), "document moved partition");
                document::remove(&old)?;
            }
        }
        Ok(paths)
    }

    fn commit_index(&self, db: &mut Database, records: &[SkillRecord]) -> Result<()> {
        let tx = db.conn_mut().transaction()?;
        for record in records {
            self.index_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn index_record(&self, conn: &Connection, record: &SkillRecord) -> Result<EmbedOutcome> {
        lexical::write_entry(conn, record)?;
        let outcome = self
            .semantic
            .embed_and_cache(conn, &record.skill_id, &record.semantic_text())?;
        write_meta(conn, record)?;
        Ok(outcome)
    }
}

/// Remove documents this write created; replaced documents stay.
fn discard_created(paths: &[PathBuf], created: &[bool]) {
    for (path, _) in paths.iter().zip(created).filter(|(_, created)| **created) {
        if let Err(err) = document::remove(path) {
            tracing::warn!(path = %path.display(), error = %err, "could not remove unindexed document");
        }
    }
}

fn write_meta(conn: &Connection, record: &SkillRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO skills_meta ({META_COLUMNS}, indexed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ),
        params![
            record.skill_id,
            record.kind.as_str(),
            encode_list(&record.domain_tags)?,
            record.scope.as_str(),
            encode_list(&record.stack_context)?,
            record.created.to_string(),
            record.project_origin,
            record.verified_by.as_str(),
            record.status.as_str(),
            record.last_used.map(|d| d.to_string()),
            i64::from(record.reuse_count),
            record.review_after.map(i64::from),
            record.supersedes,
            encode_list(&record.conflict_with)?,
            record.title,
            record.content,
            record.location.as_ref().map(|p| p.to_string_lossy().into_owned()),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn fetch(conn: &Connection, skill_id: &str) -> Result<Option<SkillRecord>> {
    let row = conn
        .query_row(
            &format!("SELECT {META_COLUMNS} FROM skills_meta WHERE skill_id = ?"),
            [skill_id],
            MetaRow::from_row,
        )
        .optional()?;
    row.map(MetaRow::into_record).transpose()
}

/// Load the records for a set of ids; unknown ids are absent from the map.
pub(crate) fn records_by_id(conn: &Connection, skill_ids: &[String]) -> Result<HashMap<String, SkillRecord>> {
    let mut found = HashMap::with_capacity(skill_ids.len());
    for skill_id in skill_ids {
        if let Some(record) = fetch(conn, skill_id)? {
            found.insert(skill_id.clone(), record);
        }
    }
    Ok(found)
}

fn location_of(conn: &Connection, skill_id: &str) -> Result<Option<PathBuf>> {
    let location: Option<Option<String>> = conn
        .query_row(
            "SELECT location FROM skills_meta WHERE skill_id = ?",
            [skill_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(location.flatten().map(PathBuf::from))
}

fn query_records(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<SkillRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, MetaRow::from_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?.into_record()?);
    }
    Ok(records)
}

fn encode_list(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|err| MemoryError::Serialization(err.to_string()))
}

fn decode_list(column: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|err| MemoryError::Storage(format!("corrupt {column} column: {err}")))
}

fn decode_date(column: &str, raw: &str) -> Result<NaiveDate> {
    raw.parse()
        .map_err(|err| MemoryError::Storage(format!("corrupt {column} column '{raw}': {err}")))
}

/// Raw `skills_meta` row before decoding.
struct MetaRow {
    skill_id: String,
    kind: String,
    domain_tags: String,
    scope: String,
    stack_context: String,
    created: String,
    project_origin: String,
    verified_by: String,
    status: String,
    last_used: Option<String>,
    reuse_count: i64,
    review_after: Option<i64>,
    supersedes: Option<String>,
    conflict_with: String,
    title: String,
    content: String,
    location: Option<String>,
}

impl MetaRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            skill_id: row.get(0)?,
            kind: row.get(1)?,
            domain_tags: row.get(2)?,
            scope: row.get(3)?,
            stack_context: row.get(4)?,
            created: row.get(5)?,
            project_origin: row.get(6)?,
            verified_by: row.get(7)?,
            status: row.get(8)?,
            last_used: row.get(9)?,
            reuse_count: row.get(10)?,
            review_after: row.get(11)?,
            supersedes: row.get(12)?,
            conflict_with: row.get(13)?,
            title: row.get(14)?,
            content: row.get(15)?,
            location: row.get(16)?,
        })
    }

    fn into_record(self) -> Result<SkillRecord> {
        let corrupt = |column: &str, err: MemoryError| {
            MemoryError::Storage(format!("corrupt {column} for '{}': {err}", self.skill_id))
        };
        Ok(SkillRecord {
            kind: self.kind.parse().map_err(|e| corrupt("kind", e))?,
            domain_tags: decode_list("domain_tags", &self.domain_tags)?,
            scope: self.scope.parse().map_err(|e| corrupt("scope", e))?,
            stack_context: decode_list("stack_context", &self.stack_context)?,
            created: decode_date("created", &self.created)?,
            project_origin: self.project_origin.clone(),
            verified_by: self.verified_by.parse().map_err(|e| corrupt("verified_by", e))?,
            status: self.status.parse().map_err(|e| corrupt("status", e))?,
            last_used: self
                .last_used
                .as_deref()
                .map(|raw| decode_date("last_used", raw))
                .transpose()?,
            reuse_count: u32::try_from(self.reuse_count)
                .map_err(|_| MemoryError::Storage(format!("corrupt reuse_count {}", self.reuse_count)))?,
            review_after: self
                .review_after
                .map(|days| {
                    u32::try_from(days)
                        .map_err(|_| MemoryError::Storage(format!("corrupt review_after {days}")))
                })
                .transpose()?,
            supersedes: self.supersedes.clone(),
            conflict_with: decode_list("conflict_with", &self.conflict_with)?,
            title: self.title.clone(),
            content: self.content.clone(),
            location: self.location.as_deref().map(PathBuf::from),
            skill_id: self.skill_id,
        })
    }
}

#[derive(Serialize)]
struct IndexSummary<'a> {
    generated: NaiveDate,
    total: usize,
    by_kind: BTreeMap<&'static str, usize>,
    by_status: BTreeMap<&'static str, usize>,
    skills: Vec<SkillSummary<'a>>,
}

#[derive(Serialize)]
struct SkillSummary<'a> {
    skill_id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    status: &'static str,
    title: &'a str,
    domain_tags: &'a [String],
    reuse_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

fn write_summary(root: &Path, records: &[SkillRecord]) -> Result<()> {
    let mut by_kind = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    for record in records {
        *by_kind.entry(record.kind.as_str()).or_insert(0) += 1;
        *by_status.entry(record.status.as_str()).or_insert(0) += 1;
    }

    let summary = IndexSummary {
        generated: chrono::Local::now().date_naive(),
        total: records.len(),
        by_kind,
        by_status,
        skills: records
            .iter()
            .map(|record| SkillSummary {
                skill_id: &record.skill_id,
                kind: record.kind.as_str(),
                status: record.status.as_str(),
                title: &record.title,
                domain_tags: &record.domain_tags,
                reuse_count: record.reuse_count,
                path: record
                    .location
                    .as_deref()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().into_owned()),
            })
            .collect(),
    };

    let yaml = serde_yaml::to_string(&summary)
        .map_err(|err| MemoryError::Serialization(format!("encode index summary: {err}")))?;
    let mut tmp = NamedTempFile::new_in(root)?;
    tmp.write_all(yaml.as_bytes())?;
    tmp.persist(root.join(INDEX_SUMMARY))
        .map_err(|err| MemoryError::Io(err.error))?;
    Ok(())
}
