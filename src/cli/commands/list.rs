//! skm list - List stored skills

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_robot, robot_ok};
use crate::core::{SkillRecord, SkillStatus};
use crate::error::Result;
use crate::utils::{format_tags, truncate_string};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Status filter: active, deprecated, conflicted, needs_review, or all
    #[arg(long, default_value = "all")]
    pub status: String,

    /// Only skills carrying any of these tags
    #[arg(long, short)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct SkillEntry {
    skill_id: String,
    kind: String,
    title: String,
    status: String,
    scope: String,
    domain_tags: Vec<String>,
    reuse_count: u32,
    last_used: Option<String>,
}

impl From<&SkillRecord> for SkillEntry {
    fn from(r: &SkillRecord) -> Self {
        Self {
            skill_id: r.skill_id.clone(),
            kind: r.kind.to_string(),
            title: r.title.clone(),
            status: r.status.to_string(),
            scope: r.scope.to_string(),
            domain_tags: r.domain_tags.clone(),
            reuse_count: r.reuse_count,
            last_used: r.last_used.map(|d| d.to_string()),
        }
    }
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let status = match args.status.as_str() {
        "all" => None,
        other => Some(other.parse::<SkillStatus>()?),
    };

    let mut skills = ctx.store.list(status)?;
    if !args.tags.is_empty() {
        skills.retain(|s| s.domain_tags.iter().any(|t| args.tags.contains(t)));
    }
    debug!(target: "list", count = skills.len(), filters = ?args.tags, "listing skills");

    match ctx.output_format {
        OutputFormat::Json => {
            let entries: Vec<SkillEntry> = skills.iter().map(SkillEntry::from).collect();
            emit_robot(&robot_ok(serde_json::json!({
                "count": entries.len(),
                "skills": entries,
            })))
        }
        OutputFormat::Human => {
            if skills.is_empty() {
                println!("{}", "No skills found".yellow());
                return Ok(());
            }
            for skill in &skills {
                let status = match skill.status {
                    SkillStatus::Active => skill.status.as_str().green(),
                    SkillStatus::NeedsReview => skill.status.as_str().yellow(),
                    SkillStatus::Conflicted => skill.status.as_str().red(),
                    SkillStatus::Deprecated => skill.status.as_str().dimmed(),
                };
                println!(
                    "{:<32} {:<9} {:<13} {}",
                    skill.skill_id.bold(),
                    skill.kind.as_str(),
                    status,
                    truncate_string(&skill.title, 48)
                );
                println!("{:<32} {}", "", format_tags(&skill.domain_tags).dimmed());
            }
            println!();
            println!("{} skill(s)", skills.len());
            Ok(())
        }
    }
}
