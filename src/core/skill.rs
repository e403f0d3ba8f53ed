//! Skill record model

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};

/// Classification of a skill. Determines the storage partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    Skill,
    Pattern,
    Gotcha,
    Decision,
}

impl SkillKind {
    pub const ALL: [Self; 4] = [Self::Skill, Self::Pattern, Self::Gotcha, Self::Decision];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Pattern => "pattern",
            Self::Gotcha => "gotcha",
            Self::Decision => "decision",
        }
    }

    /// Directory under the memory root holding documents of this kind.
    #[must_use]
    pub const fn partition(self) -> &'static str {
        match self {
            Self::Skill | Self::Pattern => "skills",
            Self::Gotcha => "gotchas",
            Self::Decision => "decisions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Project,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
        }
    }
}

/// Lifecycle status.
///
/// `Active -> NeedsReview` on staleness (back to `Active` on re-use),
/// `Active <-> Conflicted` set by external collaborators, and
/// `* -> Deprecated` which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillStatus {
    Active,
    Deprecated,
    Conflicted,
    NeedsReview,
}

impl SkillStatus {
    pub const ALL: [Self; 4] = [
        Self::Active,
        Self::Deprecated,
        Self::Conflicted,
        Self::NeedsReview,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deprecated => "deprecated",
            Self::Conflicted => "conflicted",
            Self::NeedsReview => "needs_review",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifiedBy {
    #[default]
    Human,
    MemoryAgent,
}

impl VerifiedBy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::MemoryAgent => "memory_agent",
        }
    }
}

macro_rules! impl_str_enum {
    ($ty:ty, $label:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = MemoryError;

            fn from_str(value: &str) -> Result<Self> {
                $(
                    if value == <$ty>::$variant.as_str() {
                        return Ok(<$ty>::$variant);
                    }
                )+
                Err(MemoryError::Validation(format!(
                    concat!("unknown ", $label, " '{}'"),
                    value
                )))
            }
        }
    };
}

impl_str_enum!(SkillKind, "kind", [Skill, Pattern, Gotcha, Decision]);
impl_str_enum!(Scope, "scope", [Global, Project]);
impl_str_enum!(SkillStatus, "status", [Active, Deprecated, Conflicted, NeedsReview]);
impl_str_enum!(VerifiedBy, "verifier", [Human, MemoryAgent]);

/// A reusable knowledge unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Primary key: lowercase alphanumerics and hyphens
    pub skill_id: String,
    pub kind: SkillKind,
    pub domain_tags: Vec<String>,
    pub scope: Scope,
    pub stack_context: Vec<String>,
    pub created: NaiveDate,
    pub project_origin: String,
    pub verified_by: VerifiedBy,
    pub status: SkillStatus,
    pub last_used: Option<NaiveDate>,
    pub reuse_count: u32,
    /// Overrides the default staleness window (days)
    pub review_after: Option<u32>,
    pub supersedes: Option<String>,
    pub conflict_with: Vec<String>,
    /// First `# ` heading of `content`
    pub title: String,
    pub content: String,
    /// Document handle assigned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

impl SkillRecord {
    /// Create an active, global, human-verified record.
    pub fn new(
        skill_id: impl Into<String>,
        kind: SkillKind,
        domain_tags: Vec<String>,
        project_origin: impl Into<String>,
        created: NaiveDate,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            skill_id: skill_id.into(),
            kind,
            domain_tags,
            scope: Scope::Global,
            stack_context: Vec::new(),
            created,
            project_origin: project_origin.into(),
            verified_by: VerifiedBy::Human,
            status: SkillStatus::Active,
            last_used: None,
            reuse_count: 0,
            review_after: None,
            supersedes: None,
            conflict_with: Vec::new(),
            title: extract_title(&content),
            content,
            location: None,
        }
    }

    /// Replace the body, re-deriving the title.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.title = extract_title(&self.content);
    }

    /// Text used for embeddings and content hashing.
    #[must_use]
    pub fn semantic_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    /// Relative path of this record's document under the memory root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.kind.partition()).join(format!("{}.md", self.skill_id))
    }

    /// Date staleness is measured from.
    #[must_use]
    pub fn reference_date(&self) -> NaiveDate {
        self.last_used.unwrap_or(self.created)
    }
}

/// Title is the first line beginning with `# `.
#[must_use]
pub fn extract_title(content: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .unwrap_or_default()
}
