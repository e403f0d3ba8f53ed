//! skm touch - Record that a skill was used today

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct TouchArgs {
    /// Skill id
    pub skill_id: String,
}

pub fn run(ctx: &AppContext, args: &TouchArgs) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let record = ctx.store.record_use(&args.skill_id, today)?;

    match ctx.output_format {
        OutputFormat::Json => emit_robot(&robot_ok(serde_json::json!({
            "skill_id": record.skill_id,
            "reuse_count": record.reuse_count,
            "last_used": record.last_used,
            "status": record.status,
        }))),
        OutputFormat::Human => {
            println!(
                "{} {} (used {} time(s), status {})",
                "Recorded use of".green().bold(),
                record.skill_id,
                record.reuse_count,
                record.status
            );
            Ok(())
        }
    }
}
