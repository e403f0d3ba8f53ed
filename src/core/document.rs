//! Persisted skill documents
//!
//! One markdown file per record: a YAML frontmatter block holding the
//! metadata, followed by free-text content. Documents are the source of
//! truth; the index database can always be regenerated from them.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use super::skill::{Scope, SkillKind, SkillRecord, SkillStatus, VerifiedBy, extract_title};
use super::validation;
use crate::error::{MemoryError, Result};

/// Partition directories, one per kind group.
pub const PARTITIONS: [&str; 3] = ["skills", "gotchas", "decisions"];

const DELIMITER: &str = "---";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Frontmatter {
    skill_id: String,
    #[serde(rename = "type")]
    kind: SkillKind,
    domain_tags: Vec<String>,
    scope: Scope,
    #[serde(default)]
    stack_context: Vec<String>,
    created: NaiveDate,
    #[serde(default)]
    last_used: Option<NaiveDate>,
    #[serde(default)]
    reuse_count: u32,
    project_origin: String,
    #[serde(default = "default_status")]
    status: SkillStatus,
    #[serde(default)]
    review_after: Option<u32>,
    #[serde(default)]
    supersedes: Option<String>,
    #[serde(default)]
    conflict_with: Vec<String>,
    #[serde(default)]
    verified_by: VerifiedBy,
}

const fn default_status() -> SkillStatus {
    SkillStatus::Active
}

impl Frontmatter {
    fn from_record(record: &SkillRecord) -> Self {
        Self {
            skill_id: record.skill_id.clone(),
            kind: record.kind,
            domain_tags: record.domain_tags.clone(),
            scope: record.scope,
            stack_context: record.stack_context.clone(),
            created: record.created,
            last_used: record.last_used,
            reuse_count: record.reuse_count,
            project_origin: record.project_origin.clone(),
            status: record.status,
            review_after: record.review_after,
            supersedes: record.supersedes.clone(),
            conflict_with: record.conflict_with.clone(),
            verified_by: record.verified_by,
        }
    }

    fn into_record(self, content: String) -> SkillRecord {
        SkillRecord {
            skill_id: self.skill_id,
            kind: self.kind,
            domain_tags: self.domain_tags,
            scope: self.scope,
            stack_context: self.stack_context,
            created: self.created,
            project_origin: self.project_origin,
            verified_by: self.verified_by,
            status: self.status,
            last_used: self.last_used,
            reuse_count: self.reuse_count,
            review_after: self.review_after,
            supersedes: self.supersedes,
            conflict_with: self.conflict_with,
            title: extract_title(&content),
            content,
            location: None,
        }
    }
}

/// Render a record as a document.
pub fn render(record: &SkillRecord) -> Result<String> {
    let yaml = serde_yaml::to_string(&Frontmatter::from_record(record))
        .map_err(|err| MemoryError::Serialization(format!("encode frontmatter: {err}")))?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{}", record.content))
}

/// Parse a document. `source` is only used in error messages.
pub fn parse(text: &str, source: &Path) -> Result<SkillRecord> {
    let invalid = |message: String| MemoryError::InvalidDocument {
        path: source.to_path_buf(),
        message,
    };

    let (yaml, content) = split_frontmatter(text)
        .ok_or_else(|| invalid("missing frontmatter block".to_string()))?;
    let frontmatter: Frontmatter =
        serde_yaml::from_str(yaml).map_err(|err| invalid(err.to_string()))?;
    let record = frontmatter.into_record(content.to_string());
    validation::validate(&record).map_err(|err| invalid(err.to_string()))?;
    Ok(record)
}

fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\r\n")
        .or_else(|| text.strip_prefix("---\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let yaml = &rest[..offset];
            let content = &rest[offset + line.len()..];
            return Some((yaml, content));
        }
        offset += line.len();
    }
    None
}

/// Read and parse a document, recording its location.
pub fn read(path: &Path) -> Result<SkillRecord> {
    let text = std::fs::read_to_string(path)?;
    let mut record = parse(&text, path)?;
    record.location = Some(path.to_path_buf());
    Ok(record)
}

/// Write a record's document under `root`, replacing any previous version.
///
/// The file is written to a sibling temp file and renamed into place.
pub fn write(root: &Path, record: &SkillRecord) -> Result<PathBuf> {
    let path = root.join(record.relative_path());
    let dir = path
        .parent()
        .ok_or_else(|| MemoryError::Storage(format!("no parent for {}", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let rendered = render(record)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(rendered.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|err| MemoryError::Io(err.error))?;
    Ok(path)
}

/// Remove a document. Missing files are not an error.
pub fn remove(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Result of scanning a memory directory.
#[derive(Debug, Default)]
pub struct CorpusScan {
    pub records: Vec<SkillRecord>,
    /// Documents that could not be parsed
    pub skipped: Vec<PathBuf>,
}

/// List document paths under every partition of `root`, sorted.
pub fn document_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = PARTITIONS
        .iter()
        .map(|partition| root.join(partition))
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| {
            WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
                .collect::<Vec<_>>()
        })
        .collect();
    paths.sort();
    paths
}

/// Load every parseable document under `root` without touching any index.
pub fn load_corpus(root: &Path) -> CorpusScan {
    let mut scan = CorpusScan::default();
    for path in document_paths(root) {
        match read(&path) {
            Ok(record) => scan.records.push(record),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable skill document");
                scan.skipped.push(path);
            }
        }
    }
    scan
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample() -> SkillRecord {
        let mut record = SkillRecord::new(
            "jwt-auth",
            SkillKind::Gotcha,
            vec!["auth".into(), "security".into()],
            "billing-api",
            NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(),
            "# JWT Auth\n\nUse RS256 for production JWT tokens.\n",
        );
        record.stack_context = vec!["rust".into(), "axum".into()];
        record.last_used = NaiveDate::from_ymd_opt(2026, 3, 1);
        record.reuse_count = 4;
        record.review_after = Some(30);
        record.conflict_with = vec!["jwt-hs256".into()];
        record
    }

    #[test]
    fn test_render_then_parse_preserves_fields() {
        let record = sample();
        let text = render(&record).unwrap();
        assert!(text.starts_with("---\n"));
        assert!(text.contains("type: gotcha"));

        let parsed = parse(&text, Path::new("mem.md")).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_defaults_for_optional_keys() {
        let text = "---\nskill_id: tiny\ntype: skill\ndomain_tags: [python]\nscope: project\ncreated: 2026-02-21\nproject_origin: demo\n---\n# Tiny\n";
        let record = parse(text, Path::new("tiny.md")).unwrap();
        assert_eq!(record.status, SkillStatus::Active);
        assert_eq!(record.reuse_count, 0);
        assert_eq!(record.verified_by, VerifiedBy::Human);
        assert_eq!(record.scope, Scope::Project);
        assert_eq!(record.title, "Tiny");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let text = "---\nskill_id: tiny\ntype: skill\ndomain_tags: [python]\nscope: global\ncreated: 2026-02-21\nproject_origin: demo\nflavor: spicy\n---\nbody";
        let err = parse(text, Path::new("tiny.md")).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidDocument { .. }));
    }

    #[test]
    fn test_missing_required_key_rejected() {
        let text = "---\nskill_id: tiny\ntype: skill\ndomain_tags: [python]\nscope: global\n---\nbody";
        assert!(parse(text, Path::new("tiny.md")).is_err());
    }

    #[test]
    fn test_invalid_skill_id_rejected() {
        let text = "---\nskill_id: INVALID ID WITH SPACES\ntype: skill\ndomain_tags: [x]\nscope: global\ncreated: 2026-02-21\nproject_origin: demo\n---\nContent\n";
        assert!(parse(text, Path::new("bad.md")).is_err());
    }

    #[test]
    fn test_no_frontmatter_rejected() {
        assert!(parse("# Just markdown", Path::new("plain.md")).is_err());
    }

    #[test]
    fn test_write_and_read_from_partition() {
        let dir = tempdir().unwrap();
        let record = sample();
        let path = write(dir.path(), &record).unwrap();
        assert_eq!(path, dir.path().join("gotchas/jwt-auth.md"));

        let loaded = read(&path).unwrap();
        assert_eq!(loaded.location.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.domain_tags, record.domain_tags);
    }

    #[test]
    fn test_load_corpus_counts_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), &sample()).unwrap();
        std::fs::create_dir_all(dir.path().join("skills")).unwrap();
        std::fs::write(dir.path().join("skills/broken.md"), "---\nskill_id: [\n---\n").unwrap();
        std::fs::write(dir.path().join("skills/notes.txt"), "ignored").unwrap();

        let scan = load_corpus(dir.path());
        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.skipped.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        assert!(remove(&dir.path().join("skills/nope.md")).is_ok());
    }
}
