//! Promotion analysis
//!
//! Looks at a snapshot spanning several projects (the same `skill_id`
//! observed with different `project_origin` values) and proposes:
//! - gotcha -> pattern, once the gotcha shows up in enough projects
//! - project -> global scope, once a project-scoped skill shows up in every
//!   known project
//!
//! Purely advisory; `apply_promotion` is the explicit follow-up.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::{Scope, SkillKind, SkillRecord};
use crate::error::Result;
use crate::storage::CorpusStore;

/// Default minimum number of distinct projects for gotcha promotion
pub const DEFAULT_MIN_PROJECT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Proposal {
    /// Reclassify a gotcha as a reusable pattern
    Pattern,
    /// Widen a project-scoped skill to global scope
    GlobalScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionCandidate {
    pub skill_id: String,
    pub proposal: Proposal,
    pub current_kind: SkillKind,
    pub current_scope: Scope,
    pub project_count: usize,
    pub projects: Vec<String>,
    /// Sum of `reuse_count` across observations
    pub usage_count: u64,
    pub reason: String,
}

/// Promotion candidates, most widely used first.
#[must_use]
pub fn find_candidates(records: &[SkillRecord], min_project_count: usize) -> Vec<PromotionCandidate> {
    let known_projects: BTreeSet<&str> = records
        .iter()
        .map(|record| record.project_origin.as_str())
        .collect();

    let mut groups: BTreeMap<&str, Vec<&SkillRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.skill_id.as_str()).or_default().push(record);
    }

    let mut candidates = Vec::new();
    for (skill_id, mut observations) in groups {
        observations.sort_by(|a, b| a.project_origin.cmp(&b.project_origin));
        let projects: BTreeSet<&str> = observations
            .iter()
            .map(|record| record.project_origin.as_str())
            .collect();
        let project_count = projects.len();
        let usage_count = observations
            .iter()
            .map(|record| u64::from(record.reuse_count))
            .sum();

        // The observation that triggered the proposal supplies its "before" state.
        let candidate = |proposal: Proposal, trigger: &SkillRecord, reason: String| PromotionCandidate {
            skill_id: skill_id.to_string(),
            proposal,
            current_kind: trigger.kind,
            current_scope: trigger.scope,
            project_count,
            projects: projects.iter().map(|p| (*p).to_string()).collect(),
            usage_count,
            reason,
        };

        let gotcha = observations.iter().copied().find(|r| r.kind == SkillKind::Gotcha);
        if let Some(gotcha) = gotcha.filter(|_| project_count >= min_project_count) {
            candidates.push(candidate(
                Proposal::Pattern,
                gotcha,
                format!("used across {project_count} projects, consider elevating to a reusable pattern"),
            ));
        }

        let in_every_project = !known_projects.is_empty() && project_count >= known_projects.len();
        let local = observations.iter().copied().find(|r| r.scope == Scope::Project);
        if let Some(local) = local.filter(|_| in_every_project) {
            candidates.push(candidate(
                Proposal::GlobalScope,
                local,
                format!("used in all {project_count} known projects, consider global scope"),
            ));
        }
    }

    candidates.sort_by(|a, b| {
        b.project_count
            .cmp(&a.project_count)
            .then_with(|| a.skill_id.cmp(&b.skill_id))
            .then_with(|| a.proposal.cmp(&b.proposal))
    });
    candidates
}

/// Apply a candidate's change to the stored record.
///
/// The record is re-read so that concurrent edits are kept; a kind change
/// moves the document to its new partition.
pub fn apply_promotion(store: &CorpusStore, candidate: &PromotionCandidate) -> Result<SkillRecord> {
    let mut record = store.get(&candidate.skill_id)?;
    match candidate.proposal {
        Proposal::Pattern => record.kind = SkillKind::Pattern,
        Proposal::GlobalScope => record.scope = Scope::Global,
    }
    let location = store.upsert(&record)?;
    record.location = Some(location);
    tracing::info!(skill_id = %record.skill_id, proposal = ?candidate.proposal, "promotion applied");
    Ok(record)
}

/// Human-readable promotion report
#[must_use]
pub fn format_report(candidates: &[PromotionCandidate]) -> String {
    if candidates.is_empty() {
        return "No promotion candidates detected.".to_string();
    }

    let mut lines = vec![
        format!("{} promotion candidate(s) found:", candidates.len()),
        String::new(),
    ];
    for (i, candidate) in candidates.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, candidate.skill_id));
        match candidate.proposal {
            Proposal::Pattern => {
                lines.push(format!("   Type: {} -> pattern", candidate.current_kind));
            }
            Proposal::GlobalScope => {
                lines.push(format!("   Scope: {} -> global", candidate.current_scope));
            }
        }
        lines.push(format!(
            "   Usage: {} times across {} projects ({})",
            candidate.usage_count,
            candidate.project_count,
            candidate.projects.join(", ")
        ));
        lines.push(format!("   Reason: {}", candidate.reason));
        lines.push(String::new());
    }
    lines.join("\n")
}
