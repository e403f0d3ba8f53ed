//! E2E Scenario: documents on disk are the source of truth

use std::sync::Arc;
use std::thread;

use skill_memory::core::{SkillKind, load_corpus};
use skill_memory::error::Result;
use skill_memory::search::HybridRetriever;
use skill_memory::storage::{CorpusStore, INDEX_SUMMARY};
use skill_memory::test_utils::CorpusFixture;
use skill_memory::test_utils::fixtures::record;

const HAND_WRITTEN: &str = "---
skill_id: vacuum-schedule
type: decision
domain_tags: [db, ops]
scope: project
created: 2026-01-02
project_origin: warehouse
---
# Vacuum schedule

Run VACUUM ANALYZE nightly on the reporting replica.
";

#[test]
fn test_hand_written_document_becomes_searchable() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    fixture.write_document("decisions", "vacuum-schedule.md", HAND_WRITTEN)?;
    assert_eq!(fixture.store.count()?, 0);

    let report = fixture.store.rebuild()?;
    assert_eq!(report.indexed, 1);
    assert_eq!(report.embedded, 1);
    assert!(fixture.root().join(INDEX_SUMMARY).exists());

    let hits = fixture.retriever().search("vacuum replica", 3)?;
    assert_eq!(hits[0].record.skill_id, "vacuum-schedule");
    assert_eq!(hits[0].record.title, "Vacuum schedule");
    Ok(())
}

#[test]
fn test_rebuild_matches_fresh_store_over_same_documents() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    fixture.insert_all(&[
        record("a-one", SkillKind::Skill, &["x"], "# One\nalpha beta"),
        record("b-two", SkillKind::Gotcha, &["x"], "# Two\nbeta gamma"),
    ])?;
    let before = fixture.store.list(None)?;

    // A second store over the same root, with its own database file
    let other = CorpusStore::open_with_database(
        fixture.root(),
        "other.db",
        skill_memory::search::SemanticIndex::hashed(64),
    )?;
    let report = other.rebuild()?;
    assert_eq!(report.indexed, 2);
    assert_eq!(other.list(None)?, before);

    // Rebuilding again reuses every embedding
    let again = fixture.store.rebuild()?;
    assert_eq!(again.reused, 2);
    assert_eq!(again.embedded, 0);
    Ok(())
}

#[test]
fn test_removed_document_drops_out_on_rebuild() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    fixture.insert_all(&[
        record("keep-me", SkillKind::Skill, &["x"], "# Keep\nretained text"),
        record("drop-me", SkillKind::Skill, &["x"], "# Drop\nremoved text"),
    ])?;
    std::fs::remove_file(fixture.root().join("skills/drop-me.md"))?;

    let report = fixture.store.rebuild()?;
    assert_eq!(report.indexed, 1);
    assert_eq!(report.pruned, 1);
    assert!(fixture.retriever().search("removed", 5)?.is_empty());
    assert_eq!(load_corpus(fixture.root()).records.len(), 1);
    Ok(())
}

#[test]
fn test_readers_see_consistent_snapshots_during_writes() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    let store = Arc::clone(&fixture.store);

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || -> Result<()> {
            for n in 0..40 {
                store.upsert(&record(
                    &format!("note-{n}"),
                    SkillKind::Skill,
                    &["notes"],
                    &format!("# Note {n}\nshared keyword body {n}"),
                ))?;
            }
            Ok(())
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let retriever = HybridRetriever::new(Arc::clone(&store));
            thread::spawn(move || -> Result<()> {
                for _ in 0..20 {
                    for hit in retriever.search("shared keyword", 10)? {
                        // Every ranked hit resolves to a complete record
                        assert!(hit.record.title.starts_with("Note "));
                    }
                }
                Ok(())
            })
        })
        .collect();

    writer.join().unwrap()?;
    for reader in readers {
        reader.join().unwrap()?;
    }
    assert_eq!(store.count()?, 40);
    Ok(())
}
