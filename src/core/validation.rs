//! Skill record validation

use std::sync::LazyLock;

use regex::Regex;

use super::skill::SkillRecord;
use crate::error::{MemoryError, Result};

static SKILL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("skill id pattern is valid")
});

/// Check a skill id: lowercase alphanumerics and hyphens, starting with an alphanumeric.
pub fn validate_skill_id(skill_id: &str) -> Result<()> {
    if SKILL_ID_RE.is_match(skill_id) {
        Ok(())
    } else {
        Err(MemoryError::Validation(format!(
            "skill_id '{skill_id}' must be lowercase kebab-case (e.g. my-skill)"
        )))
    }
}

/// Validate a record against the model invariants. Runs before any write.
pub fn validate(record: &SkillRecord) -> Result<()> {
    validate_skill_id(&record.skill_id)?;

    if record.domain_tags.is_empty() {
        return Err(MemoryError::Validation(format!(
            "skill '{}' needs at least one domain tag",
            record.skill_id
        )));
    }
    if record.domain_tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(MemoryError::Validation(format!(
            "skill '{}' has a blank domain tag",
            record.skill_id
        )));
    }

    Ok(())
}
