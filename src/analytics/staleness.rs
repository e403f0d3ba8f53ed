//! Staleness detection
//!
//! A skill is stale when the days since it was last used (or created, if it
//! never was) exceed its `review_after` window, or the configured default.

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::{SkillRecord, SkillStatus};
use crate::error::{MemoryError, Result};
use crate::storage::CorpusStore;

/// Default review window in days
pub const DEFAULT_REVIEW_AFTER_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleFinding {
    pub skill_id: String,
    pub status: SkillStatus,
    pub last_used: Option<NaiveDate>,
    /// Days since `last_used`, or since `created` when never used
    pub days_since: i64,
    /// Window that was exceeded
    pub review_after: u32,
}

/// Days since the record's reference date, if it is past its window.
#[must_use]
pub fn check(record: &SkillRecord, today: NaiveDate, default_days: u32) -> Option<StaleFinding> {
    let review_after = record.review_after.unwrap_or(default_days);
    let days_since = (today - record.reference_date()).num_days();
    (days_since > i64::from(review_after)).then(|| StaleFinding {
        skill_id: record.skill_id.clone(),
        status: record.status,
        last_used: record.last_used,
        days_since,
        review_after,
    })
}

/// Stale non-deprecated records, most stale first.
#[must_use]
pub fn find_stale(records: &[SkillRecord], today: NaiveDate, default_days: u32) -> Vec<StaleFinding> {
    let mut findings: Vec<StaleFinding> = records
        .iter()
        .filter(|record| record.status != SkillStatus::Deprecated)
        .filter_map(|record| check(record, today, default_days))
        .collect();
    findings.sort_by(|a, b| {
        b.days_since
            .cmp(&a.days_since)
            .then_with(|| a.skill_id.cmp(&b.skill_id))
    });
    findings
}

/// Move findings that are still `active` to `needs_review`.
///
/// Each record is re-read under the store's write lock; records in any other
/// status, or deleted since the snapshot, are left alone. Returns the ids
/// that changed.
pub fn apply_stale(store: &CorpusStore, findings: &[StaleFinding]) -> Result<Vec<String>> {
    let mut changed = Vec::new();
    for finding in findings {
        match store.transition_status(&finding.skill_id, SkillStatus::Active, SkillStatus::NeedsReview) {
            Ok(true) => changed.push(finding.skill_id.clone()),
            Ok(false) => {}
            Err(MemoryError::NotFound(_)) => {
                tracing::debug!(skill_id = %finding.skill_id, "stale skill no longer exists");
            }
            Err(err) => return Err(err),
        }
    }
    tracing::info!(marked = changed.len(), "stale skills marked for review");
    Ok(changed)
}

/// Human-readable staleness report
#[must_use]
pub fn format_report(findings: &[StaleFinding]) -> String {
    if findings.is_empty() {
        return "No stale skills detected.".to_string();
    }

    let mut lines = vec![
        format!("{} skill(s) need review (stale):", findings.len()),
        String::new(),
    ];
    for finding in findings {
        let last_used = finding
            .last_used
            .map_or_else(|| "never".to_string(), |date| date.to_string());
        lines.push(format!(
            "* {}: {} days since use [{}]",
            finding.skill_id, finding.days_since, finding.status
        ));
        lines.push(format!(
            "  Last used: {last_used} (limit: {} days)",
            finding.review_after
        ));
    }
    lines.join("\n")
}
