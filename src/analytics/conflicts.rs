//! Bounded candidate selection for conflict review
//!
//! Deciding whether two skills contradict each other belongs to an
//! [`Advisor`](crate::advisory::Advisor). This module only picks which pairs
//! are worth asking about: live skills sharing a domain tag, capped at
//! `max_pairs`.

use std::collections::BTreeSet;

use serde::Serialize;

use super::same_tag_pairs;
use crate::core::{SkillRecord, SkillStatus};

/// Default ceiling on pairs handed to the advisor per run
pub const DEFAULT_MAX_PAIRS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictCandidate {
    pub skill_a: String,
    pub skill_b: String,
    pub shared_tags: Vec<String>,
}

/// Distinct unordered pairs of reviewable skills sharing a domain tag.
///
/// Deprecated and already-conflicted skills are skipped. Pairs come out in
/// `(skill_a, skill_b)` order with `skill_a < skill_b`.
#[must_use]
pub fn candidate_pairs(records: &[SkillRecord], max_pairs: usize) -> Vec<ConflictCandidate> {
    let mut live: Vec<&SkillRecord> = records
        .iter()
        .filter(|r| !matches!(r.status, SkillStatus::Deprecated | SkillStatus::Conflicted))
        .collect();
    live.sort_by(|a, b| a.skill_id.cmp(&b.skill_id));
    live.dedup_by(|a, b| a.skill_id == b.skill_id);

    let (pairs, truncated) = same_tag_pairs(&live, max_pairs);
    if truncated {
        tracing::debug!(max_pairs, "conflict candidates capped");
    }
    pairs
        .into_iter()
        .map(|(i, j)| {
            let (a, b) = (live[i], live[j]);
            let tags_b: BTreeSet<&String> = b.domain_tags.iter().collect();
            let shared: BTreeSet<&String> = a.domain_tags.iter().filter(|t| tags_b.contains(t)).collect();
            ConflictCandidate {
                skill_a: a.skill_id.clone(),
                skill_b: b.skill_id.clone(),
                shared_tags: shared.into_iter().cloned().collect(),
            }
        })
        .collect()
}
