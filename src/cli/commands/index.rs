//! skm index - Rebuild the index from the documents on disk

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_robot, robot_ok};
use crate::error::Result;
use crate::storage::INDEX_SUMMARY;

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// List every skipped document
    #[arg(long)]
    pub show_skipped: bool,
}

pub fn run(ctx: &AppContext, args: &IndexArgs) -> Result<()> {
    let report = ctx.store.rebuild()?;

    match ctx.output_format {
        OutputFormat::Json => {
            let warnings = report
                .skipped
                .iter()
                .map(|path| format!("skipped unreadable document {}", path.display()))
                .collect();
            emit_robot(&robot_ok(&report).with_warnings(warnings))
        }
        OutputFormat::Human => {
            println!(
                "{} {} skill(s) from {}",
                "Indexed".green().bold(),
                report.indexed,
                ctx.root.display()
            );
            if ctx.store.semantic().is_available() {
                println!(
                    "  embeddings: {} computed, {} reused, {} pruned",
                    report.embedded, report.reused, report.pruned
                );
            } else {
                println!("  {}", "semantic index disabled; lexical only".dimmed());
            }
            if !report.skipped.is_empty() {
                println!(
                    "  {} {} document(s) skipped",
                    "warning:".yellow().bold(),
                    report.skipped.len()
                );
                if args.show_skipped {
                    for path in &report.skipped {
                        println!("    {}", path.display());
                    }
                }
            }
            println!("  summary: {}", ctx.root.join(INDEX_SUMMARY).display());
            Ok(())
        }
    }
}
