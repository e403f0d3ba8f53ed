//! E2E Scenario: storing skills and retrieving them with hybrid ranking

use std::sync::Arc;

use skill_memory::core::SkillKind;
use skill_memory::error::{MemoryError, Result};
use skill_memory::search::{Embedder, SemanticIndex};
use skill_memory::test_utils::CorpusFixture;
use skill_memory::test_utils::fixtures::record;

const UNRELATED: [(&str, &str); 9] = [
    ("db-migrations", "# Migrations\nRun schema migrations inside a transaction."),
    ("cache-busting", "# Cache busting\nAppend a content hash to static asset names."),
    ("retry-backoff", "# Backoff\nRetry with exponential backoff and jitter."),
    ("log-levels", "# Log levels\nKeep debug output out of production logs."),
    ("feature-flags", "# Flags\nRemove feature flags once the rollout finishes."),
    ("css-grid", "# Layout\nPrefer grid over nested flex containers."),
    ("pagination", "# Pagination\nUse cursor pagination for large tables."),
    ("timezones", "# Time\nStore timestamps in UTC and convert at the edge."),
    ("docker-layers", "# Images\nOrder Dockerfile steps from least to most volatile."),
];

fn seed(fixture: &CorpusFixture) -> Result<()> {
    fixture.store.upsert(&record(
        "jwt-auth",
        SkillKind::Gotcha,
        &["auth"],
        "# JWT signing\n\nUse RS256 for production JWT tokens.",
    ))?;
    for (id, content) in UNRELATED {
        fixture
            .store
            .upsert(&record(id, SkillKind::Skill, &["misc"], content))?;
    }
    Ok(())
}

#[test]
fn test_jwt_query_ranks_matching_record_first() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    seed(&fixture)?;
    assert_eq!(fixture.store.count()?, 10);

    let results = fixture.retriever().search("jwt rs256", 5)?;
    assert!(!results.is_empty());
    assert_eq!(results[0].record.skill_id, "jwt-auth");
    assert!(results[0].lexical_score > 0.0);
    assert!(results[0].score > 0.0);
    assert!(results[0].semantic_score.is_some());
    Ok(())
}

#[test]
fn test_lexical_only_matches_normalized_lexical_ranking() -> Result<()> {
    let fixture = CorpusFixture::lexical_only()?;
    seed(&fixture)?;
    fixture.store.upsert(&record(
        "jwt-rotation",
        SkillKind::Pattern,
        &["auth"],
        "# Key rotation\nRotate JWT signing keys quarterly.",
    ))?;

    let retriever = fixture.retriever();
    let hybrid = retriever.search("jwt rs256 production", 10)?;
    let lexical = retriever.search_lexical("jwt rs256 production", 10)?;

    let ids = |results: &[skill_memory::search::HybridResult]| -> Vec<String> {
        results.iter().map(|r| r.record.skill_id.clone()).collect()
    };
    assert_eq!(ids(&hybrid), ids(&lexical));
    for result in &hybrid {
        assert!(result.semantic_score.is_none());
        assert!((result.score - result.normalized_lexical).abs() < f32::EPSILON);
    }
    Ok(())
}

struct OfflineEmbedder;

impl Embedder for OfflineEmbedder {
    fn model_id(&self) -> &str {
        "offline"
    }

    fn dims(&self) -> usize {
        8
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(MemoryError::IndexUnavailable("backend offline".to_string()))
    }
}

#[test]
fn test_failing_backend_degrades_to_lexical() -> Result<()> {
    let fixture = CorpusFixture::with_semantic(SemanticIndex::with_backend(Arc::new(OfflineEmbedder)))?;
    seed(&fixture)?;

    let results = fixture.retriever().search("jwt rs256", 3)?;
    assert_eq!(results[0].record.skill_id, "jwt-auth");
    assert!(results[0].semantic_score.is_none());
    Ok(())
}

#[test]
fn test_usage_breaks_lexical_ties() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    let body = "# Pool sizing\nSize the connection pool to the core count.";
    fixture
        .store
        .upsert(&record("pool-a", SkillKind::Skill, &["db"], body))?;
    fixture
        .store
        .upsert(&record("pool-b", SkillKind::Skill, &["db"], body))?;
    let today = chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    for _ in 0..5 {
        fixture.store.record_use("pool-b", today)?;
    }

    let results = fixture.retriever().search("connection pool", 2)?;
    assert_eq!(results[0].record.skill_id, "pool-b");
    assert!(results[0].usage_score > results[1].usage_score);
    Ok(())
}

#[test]
fn test_no_match_is_empty() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    seed(&fixture)?;
    assert!(fixture.retriever().search("kubernetes", 5)?.is_empty());
    assert!(fixture.retriever().search("", 5)?.is_empty());
    Ok(())
}
