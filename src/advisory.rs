//! Advisory service interface
//!
//! Content evaluation and contradiction detection are delegated to an
//! external (model-backed) advisor. The engine defines the contract and the
//! value types; it never calls an advisor itself. Callers feed it candidates
//! (see [`crate::analytics::conflicts`]) and apply the outcome through the
//! store, e.g. `CorpusStore::record_conflict`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{SkillKind, SkillRecord};
use crate::error::Result;

/// What to do with a piece of candidate content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvaluationDecision {
    Add,
    Update,
    #[default]
    Noop,
    Delete,
}

impl fmt::Display for EvaluationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Add => "ADD",
            Self::Update => "UPDATE",
            Self::Noop => "NOOP",
            Self::Delete => "DELETE",
        };
        f.write_str(label)
    }
}

/// An advisor's verdict plus suggested metadata for the new record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    pub decision: EvaluationDecision,
    #[serde(default)]
    pub skill_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<SkillKind>,
    #[serde(default)]
    pub domain_tags: Vec<String>,
    #[serde(default)]
    pub reason: String,
    /// Existing skill to merge into when the decision is `Update`
    #[serde(default)]
    pub merge_with: Option<String>,
}

impl Evaluation {
    /// A `Noop` carrying the reason evaluation did not happen.
    #[must_use]
    pub fn noop(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// One says "do X", the other "never do X"
    Direct,
    Approach,
    Recommendation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictFinding {
    pub skill_a: String,
    pub skill_b: String,
    pub kind: ConflictKind,
    pub description: String,
    #[serde(default)]
    pub resolution_hint: String,
}

/// External evaluation collaborator.
pub trait Advisor: Send + Sync {
    /// Decide whether `content` should become a skill, given the ids of
    /// existing skills in the same domain.
    fn evaluate(&self, content: &str, existing_ids: &[String]) -> Result<Evaluation>;

    /// `Some` when the two records contradict each other.
    fn describe_conflict(&self, a: &SkillRecord, b: &SkillRecord) -> Result<Option<ConflictFinding>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_wire_format() {
        let parsed: Evaluation =
            serde_json::from_str(r#"{"decision":"UPDATE","type":"gotcha","merge_with":"jwt-auth"}"#)
                .unwrap();
        assert_eq!(parsed.decision, EvaluationDecision::Update);
        assert_eq!(parsed.kind, Some(SkillKind::Gotcha));
        assert_eq!(parsed.merge_with.as_deref(), Some("jwt-auth"));
        assert_eq!(parsed.decision.to_string(), "UPDATE");
    }

    #[test]
    fn test_noop_default() {
        let evaluation = Evaluation::noop("advisor offline");
        assert_eq!(evaluation.decision, EvaluationDecision::Noop);
        assert_eq!(evaluation.reason, "advisor offline");
    }
}
