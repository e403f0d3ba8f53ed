//! skm search - Ranked search over the corpus

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_robot, robot_ok};
use crate::error::Result;
use crate::search::HybridResult;
use crate::utils::{format_tags, truncate_string};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Maximum number of results
    #[arg(long, short = 'n', default_value = "10")]
    pub top: usize,

    /// Rank on lexical relevance only
    #[arg(long)]
    pub lexical: bool,
}

#[derive(Serialize)]
struct SearchHit<'a> {
    skill_id: &'a str,
    kind: String,
    title: &'a str,
    domain_tags: &'a [String],
    status: String,
    score: f32,
    lexical_score: f32,
    normalized_lexical: f32,
    semantic_score: Option<f32>,
    usage_score: f32,
    location: Option<String>,
}

impl<'a> From<&'a HybridResult> for SearchHit<'a> {
    fn from(hit: &'a HybridResult) -> Self {
        Self {
            skill_id: &hit.record.skill_id,
            kind: hit.record.kind.to_string(),
            title: &hit.record.title,
            domain_tags: &hit.record.domain_tags,
            status: hit.record.status.to_string(),
            score: hit.score,
            lexical_score: hit.lexical_score,
            normalized_lexical: hit.normalized_lexical,
            semantic_score: hit.semantic_score,
            usage_score: hit.usage_score,
            location: hit.record.location.as_ref().map(|p| p.display().to_string()),
        }
    }
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let results = if args.lexical {
        ctx.retriever.search_lexical(&args.query, args.top)?
    } else {
        ctx.retriever.search(&args.query, args.top)?
    };
    debug!(target: "search", query = %args.query, count = results.len(), "search complete");

    match ctx.output_format {
        OutputFormat::Json => {
            let hits: Vec<SearchHit<'_>> = results.iter().map(SearchHit::from).collect();
            emit_robot(&robot_ok(serde_json::json!({
                "query": args.query,
                "count": hits.len(),
                "results": hits,
            })))
        }
        OutputFormat::Human => {
            if results.is_empty() {
                println!("{}", format!("No skills match '{}'", args.query).yellow());
                return Ok(());
            }
            for (rank, hit) in results.iter().enumerate() {
                let record = &hit.record;
                let title = if record.title.is_empty() {
                    "(untitled)"
                } else {
                    record.title.as_str()
                };
                println!(
                    "{:>2}. {} {} {}",
                    rank + 1,
                    record.skill_id.cyan().bold(),
                    format!("[{}]", record.kind).dimmed(),
                    format!("{:.3}", hit.score).green()
                );
                println!("    {}", truncate_string(title, 72));
                println!("    tags: {}", format_tags(&record.domain_tags).dimmed());
            }
            Ok(())
        }
    }
}
