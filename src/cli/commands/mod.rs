//! CLI command implementations
//!
//! Each subcommand has its own module with an Args struct and a `run()`
//! function.

use clap::Subcommand;

pub mod dedup;
pub mod delete;
pub mod index;
pub mod list;
pub mod promote;
pub mod search;
pub mod show;
pub mod stale;
pub mod touch;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the index from the skill documents on disk
    Index(index::IndexArgs),

    /// Search skills (hybrid lexical + semantic + usage ranking)
    Search(search::SearchArgs),

    /// Show one skill
    Show(show::ShowArgs),

    /// List stored skills
    List(list::ListArgs),

    /// Delete a skill and its document
    Delete(delete::DeleteArgs),

    /// Record that a skill was used
    Touch(touch::TouchArgs),

    /// Find near-duplicate skills
    Dedup(dedup::DedupArgs),

    /// Find skills past their review window
    Stale(stale::StaleArgs),

    /// Propose promotions across project corpora
    Promote(promote::PromoteArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Index(args) => index::run(ctx, args),
        Commands::Search(args) => search::run(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Delete(args) => delete::run(ctx, args),
        Commands::Touch(args) => touch::run(ctx, args),
        Commands::Dedup(args) => dedup::run(ctx, args),
        Commands::Stale(args) => stale::run(ctx, args),
        Commands::Promote(args) => promote::run(ctx, args),
    }
}
