//! skm delete - Remove a skill and its document

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Skill id
    pub skill_id: String,
}

pub fn run(ctx: &AppContext, args: &DeleteArgs) -> Result<()> {
    ctx.store.delete(&args.skill_id)?;

    match ctx.output_format {
        OutputFormat::Json => emit_robot(&robot_ok(serde_json::json!({
            "skill_id": args.skill_id,
            "deleted": true,
        }))),
        OutputFormat::Human => {
            println!("{} {}", "Deleted".green().bold(), args.skill_id);
            Ok(())
        }
    }
}
