//! E2E Scenario: corpus maintenance (dedup, staleness, promotion, conflicts)

use chrono::NaiveDate;

use skill_memory::advisory::{Advisor, ConflictFinding, ConflictKind, Evaluation};
use skill_memory::analytics::{
    DeduplicationEngine, apply_promotion, apply_stale, candidate_pairs, find_candidates, find_stale,
};
use skill_memory::core::{SkillKind, SkillRecord, SkillStatus};
use skill_memory::error::Result;
use skill_memory::test_utils::CorpusFixture;
use skill_memory::test_utils::fixtures::record;

const TOKEN_ADVICE: &str = "Sign access tokens for the public api with an asymmetric algorithm \
    so downstream services verify signatures with the published key set and never hold the \
    private key. Rotate keys on a schedule and keep the previous key for verification until \
    its tokens expire. Reject tokens whose header names an unexpected algorithm.";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_near_duplicates_reported_from_store_snapshot() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    for (id, tail) in [("tokens-a", "Short lifetimes."), ("tokens-b", "Short expiry."), ("tokens-c", "Short windows.")] {
        fixture.store.upsert(&record(
            id,
            SkillKind::Skill,
            &["auth"],
            &format!("# Tokens\n{TOKEN_ADVICE} {tail}"),
        ))?;
    }
    fixture.store.upsert(&record(
        "css-grid",
        SkillKind::Skill,
        &["frontend"],
        "# Layout\nPrefer grid over nested flex containers.",
    ))?;

    let snapshot = fixture.store.list(None)?;
    let engine = DeduplicationEngine::new().with_threshold(0.8);
    let first = engine.scan(&snapshot);
    let second = engine.scan(&snapshot);

    assert_eq!(first, second);
    assert_eq!(first.pairs.len(), 3);
    assert_eq!(first.compared, 3);
    assert!(!first.truncated);
    assert!(first
        .pairs
        .windows(2)
        .all(|w| w[0].similarity >= w[1].similarity));
    assert!(first.pairs.iter().all(|p| p.similarity >= 0.8));
    Ok(())
}

#[test]
fn test_stale_skills_move_to_review_and_back_on_use() -> Result<()> {
    let fixture = CorpusFixture::lexical_only()?;
    let mut fresh = record("fresh", SkillKind::Skill, &["ops"], "# Fresh");
    fresh.last_used = Some(date(2026, 5, 20));
    let mut old = record("old", SkillKind::Skill, &["ops"], "# Old");
    old.review_after = Some(30);
    old.last_used = Some(date(2026, 4, 1));
    fixture.insert_all(&[fresh, old])?;

    let today = date(2026, 6, 1);
    let findings = find_stale(&fixture.store.list(None)?, today, 90);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].skill_id, "old");

    let changed = apply_stale(&fixture.store, &findings)?;
    assert_eq!(changed, vec!["old".to_string()]);
    assert_eq!(fixture.store.get("old")?.status, SkillStatus::NeedsReview);

    // Applying the same findings again changes nothing
    assert!(apply_stale(&fixture.store, &findings)?.is_empty());

    let reused = fixture.store.record_use("old", today)?;
    assert_eq!(reused.status, SkillStatus::Active);
    assert!(find_stale(&fixture.store.list(None)?, today, 90).is_empty());
    Ok(())
}

#[test]
fn test_gotcha_promoted_after_three_projects() -> Result<()> {
    let fixture = CorpusFixture::new()?;
    let local = record("retry-storm", SkillKind::Gotcha, &["net"], "# Retry storm\nAdd jitter.");
    fixture.store.upsert(&local)?;

    let elsewhere = |project: &str| {
        let mut r = local.clone();
        r.project_origin = project.to_string();
        r
    };
    let mut snapshot: Vec<SkillRecord> = fixture.store.list(None)?;
    snapshot.push(elsewhere("payments"));
    assert!(find_candidates(&snapshot, 3).is_empty());
    snapshot.push(elsewhere("search"));

    let candidates = find_candidates(&snapshot, 3);
    assert_eq!(candidates.len(), 1);
    let promoted = apply_promotion(&fixture.store, &candidates[0])?;
    assert_eq!(promoted.kind, SkillKind::Pattern);
    assert!(fixture.root().join("skills/retry-storm.md").exists());
    assert!(!fixture.root().join("gotchas/retry-storm.md").exists());

    let hits = fixture.retriever().search("jitter", 1)?;
    assert_eq!(hits[0].record.kind, SkillKind::Pattern);
    Ok(())
}

/// Flags any pair where one side says "never".
struct KeywordAdvisor;

impl Advisor for KeywordAdvisor {
    fn evaluate(&self, _content: &str, _existing_ids: &[String]) -> Result<Evaluation> {
        Ok(Evaluation::noop("not used"))
    }

    fn describe_conflict(&self, a: &SkillRecord, b: &SkillRecord) -> Result<Option<ConflictFinding>> {
        let never = |r: &SkillRecord| r.content.to_lowercase().contains("never");
        Ok((never(a) != never(b)).then(|| ConflictFinding {
            skill_a: a.skill_id.clone(),
            skill_b: b.skill_id.clone(),
            kind: ConflictKind::Direct,
            description: "opposite advice".to_string(),
            resolution_hint: String::new(),
        }))
    }
}

#[test]
fn test_advisor_findings_mark_records_conflicted() -> Result<()> {
    let fixture = CorpusFixture::lexical_only()?;
    fixture.insert_all(&[
        record("orm-always", SkillKind::Decision, &["db"], "# ORM\nAlways go through the ORM."),
        record("orm-never", SkillKind::Decision, &["db"], "# Raw SQL\nNever use the ORM for reports."),
        record("css-grid", SkillKind::Skill, &["frontend"], "# Grid"),
    ])?;

    let snapshot = fixture.store.list(None)?;
    let pairs = candidate_pairs(&snapshot, 50);
    assert_eq!(pairs.len(), 1);

    let advisor = KeywordAdvisor;
    for pair in &pairs {
        let a = fixture.store.get(&pair.skill_a)?;
        let b = fixture.store.get(&pair.skill_b)?;
        if let Some(finding) = advisor.describe_conflict(&a, &b)? {
            fixture.store.record_conflict(&finding.skill_a, &finding.skill_b)?;
        }
    }

    let always = fixture.store.get("orm-always")?;
    assert_eq!(always.status, SkillStatus::Conflicted);
    assert_eq!(always.conflict_with, vec!["orm-never".to_string()]);
    assert_eq!(fixture.store.get("orm-never")?.status, SkillStatus::Conflicted);

    // Conflicted records are no longer offered for review
    assert!(candidate_pairs(&fixture.store.list(None)?, 50).is_empty());
    Ok(())
}
