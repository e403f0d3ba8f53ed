//! Core skill types and logic

pub mod document;
pub mod skill;
pub mod validation;

pub use document::{CorpusScan, PARTITIONS, load_corpus};
pub use skill::{Scope, SkillKind, SkillRecord, SkillStatus, VerifiedBy, extract_title};
pub use validation::{validate, validate_skill_id};
