//! skm promote - Propose promotions across project corpora
//!
//! The local store is one project; every `--corpus` directory adds the
//! documents of another memory root to the snapshot.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::analytics::{apply_promotion, find_candidates, promotion};
use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_robot, robot_ok};
use crate::core::load_corpus;
use crate::error::{MemoryError, Result};

#[derive(Args, Debug)]
pub struct PromoteArgs {
    /// Other memory roots to include in the snapshot
    #[arg(long, value_name = "DIR")]
    pub corpus: Vec<PathBuf>,

    /// Minimum distinct projects for gotcha promotion
    #[arg(long)]
    pub min_projects: Option<usize>,

    /// Apply the proposals to skills in the local store
    #[arg(long)]
    pub apply: bool,
}

pub fn run(ctx: &AppContext, args: &PromoteArgs) -> Result<()> {
    let mut records = ctx.store.list(None)?;
    let mut warnings = Vec::new();
    for dir in &args.corpus {
        let scan = load_corpus(dir);
        warnings.extend(
            scan.skipped
                .iter()
                .map(|path| format!("skipped unreadable document {}", path.display())),
        );
        records.extend(scan.records);
    }

    let min_projects = args
        .min_projects
        .unwrap_or(ctx.config.analytics.min_project_count);
    let candidates = find_candidates(&records, min_projects);

    let mut applied = Vec::new();
    if args.apply {
        for candidate in &candidates {
            match apply_promotion(&ctx.store, candidate) {
                Ok(record) => applied.push(record.skill_id),
                // Seen only in another corpus; nothing local to change.
                Err(MemoryError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
    }

    match ctx.output_format {
        OutputFormat::Json => emit_robot(
            &robot_ok(serde_json::json!({
                "min_projects": min_projects,
                "candidates": candidates,
                "applied": applied,
            }))
            .with_warnings(warnings),
        ),
        OutputFormat::Human => {
            for warning in &warnings {
                eprintln!("{} {warning}", "warning:".yellow().bold());
            }
            println!("{}", promotion::format_report(&candidates));
            if args.apply {
                println!(
                    "{} {} promotion(s)",
                    "Applied".green().bold(),
                    applied.len()
                );
            }
            Ok(())
        }
    }
}
