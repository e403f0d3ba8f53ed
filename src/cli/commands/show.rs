//! skm show - Show one skill

use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_robot, robot_ok};
use crate::core::SkillRecord;
use crate::error::Result;
use crate::utils::format_tags;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Skill id
    pub skill_id: String,

    /// Metadata only, without the content body
    #[arg(long)]
    pub meta: bool,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    let record = ctx.store.get(&args.skill_id)?;
    debug!(target: "show", skill_id = %record.skill_id, mode = ?ctx.output_format, "showing skill");

    match ctx.output_format {
        OutputFormat::Json => emit_robot(&robot_ok(&record)),
        OutputFormat::Human => {
            emit_human(layout(&record, args.meta));
            Ok(())
        }
    }
}

fn layout(record: &SkillRecord, meta_only: bool) -> HumanLayout {
    let mut layout = HumanLayout::new();
    let heading = if record.title.is_empty() {
        record.skill_id.clone()
    } else {
        format!("{} ({})", record.title, record.skill_id)
    };
    layout.title(&heading);
    layout
        .kv("Type", record.kind.as_str())
        .kv("Status", record.status.as_str())
        .kv("Scope", record.scope.as_str())
        .kv("Tags", &format_tags(&record.domain_tags))
        .kv("Stack", &format_tags(&record.stack_context))
        .kv("Project", &record.project_origin)
        .kv("Created", &record.created.to_string())
        .kv(
            "Last used",
            &record
                .last_used
                .map_or_else(|| "never".to_string(), |date| date.to_string()),
        )
        .kv("Reuse count", &record.reuse_count.to_string())
        .kv("Verified by", record.verified_by.as_str());
    if let Some(days) = record.review_after {
        layout.kv("Review after", &format!("{days} days"));
    }
    if let Some(previous) = &record.supersedes {
        layout.kv("Supersedes", previous);
    }
    if !record.conflict_with.is_empty() {
        layout.kv("Conflicts", &format_tags(&record.conflict_with));
    }
    if let Some(location) = &record.location {
        layout.kv("Location", &location.display().to_string());
    }
    if !meta_only {
        layout.blank().push_line(record.content.trim_end());
    }
    layout
}
