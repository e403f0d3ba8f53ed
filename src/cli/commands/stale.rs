//! skm stale - Find skills past their review window

use clap::Args;
use colored::Colorize;

use crate::analytics::{apply_stale, find_stale, staleness};
use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct StaleArgs {
    /// Default review window in days (defaults to analytics.stale_after_days)
    #[arg(long)]
    pub days: Option<u32>,

    /// Move stale active skills to needs_review
    #[arg(long)]
    pub apply: bool,
}

pub fn run(ctx: &AppContext, args: &StaleArgs) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let days = args.days.unwrap_or(ctx.config.analytics.stale_after_days);

    let findings = find_stale(&ctx.store.list(None)?, today, days);
    let marked = if args.apply {
        apply_stale(&ctx.store, &findings)?
    } else {
        Vec::new()
    };

    match ctx.output_format {
        OutputFormat::Json => emit_robot(&robot_ok(serde_json::json!({
            "today": today,
            "default_days": days,
            "stale": findings,
            "marked": marked,
        }))),
        OutputFormat::Human => {
            println!("{}", staleness::format_report(&findings));
            if args.apply {
                println!();
                println!(
                    "{} {} skill(s) as needs_review",
                    "Marked".yellow().bold(),
                    marked.len()
                );
            }
            Ok(())
        }
    }
}
