//! skm dedup - Find near-duplicate skills

use clap::Args;
use colored::Colorize;

use crate::analytics::{DeduplicationEngine, candidate_pairs, dedup};
use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct DedupArgs {
    /// Similarity threshold in [0, 1] (defaults to analytics.dedup_threshold)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Also list same-domain pairs worth a contradiction review
    #[arg(long)]
    pub conflicts: bool,
}

pub fn run(ctx: &AppContext, args: &DedupArgs) -> Result<()> {
    let analytics = &ctx.config.analytics;
    let engine = DeduplicationEngine::new()
        .with_threshold(args.threshold.unwrap_or(analytics.dedup_threshold))
        .with_max_pairs(analytics.max_pairs);

    let records = ctx.store.list(None)?;
    let report = engine.scan(&records);
    let review = if args.conflicts {
        candidate_pairs(&records, analytics.conflict_max_pairs)
    } else {
        Vec::new()
    };

    match ctx.output_format {
        OutputFormat::Json => {
            let mut data = serde_json::json!({
                "threshold": engine.threshold(),
                "compared": report.compared,
                "truncated": report.truncated,
                "pairs": report.pairs,
            });
            if args.conflicts {
                data["conflict_candidates"] = serde_json::json!(review);
            }
            emit_robot(&robot_ok(data))
        }
        OutputFormat::Human => {
            println!("{}", dedup::format_report(&report));
            if args.conflicts {
                println!();
                if review.is_empty() {
                    println!("{}", "No pairs need a contradiction review.".dimmed());
                } else {
                    println!("{}", "Pairs to review for contradictions:".bold());
                    for candidate in &review {
                        println!(
                            "  {} <-> {} ({})",
                            candidate.skill_a,
                            candidate.skill_b,
                            candidate.shared_tags.join(", ")
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
