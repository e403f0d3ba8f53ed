use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::{MemoryError, Result};
use crate::search::{EmbeddingCache, HybridRetriever};
use crate::storage::CorpusStore;

/// Marker directory for a project-local memory root
pub const LOCAL_ROOT_DIR: &str = ".skm";

pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub store: Arc<CorpusStore>,
    pub retriever: HybridRetriever,
    pub output_format: OutputFormat,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let discovered = match &cli.root {
            Some(root) => root.clone(),
            None => Self::find_root()?,
        };
        let config = Config::load(cli.config.as_deref(), &discovered)?;

        // An explicit --root or SKM_ROOT beats a root named in config files.
        let root = match (&cli.root, &config.memory.root) {
            (None, Some(configured)) if std::env::var_os("SKM_ROOT").is_none() => {
                configured.clone()
            }
            _ => discovered,
        };

        let semantic = config.search.semantic_index()?;
        let store = Arc::new(CorpusStore::open_with_database(
            &root,
            &config.memory.database,
            semantic,
        )?);
        let cache = EmbeddingCache::with_sizes(
            config.cache.query_embeddings,
            config.cache.skill_embeddings,
        );
        let retriever = HybridRetriever::from_config(Arc::clone(&store), &config.search, cache);

        Ok(Self {
            root,
            config,
            store,
            retriever,
            output_format: cli.output_format(),
            verbosity: cli.verbose,
        })
    }

    fn find_root() -> Result<PathBuf> {
        if let Some(root) = std::env::var_os("SKM_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, LOCAL_ROOT_DIR) {
            return Ok(found);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| MemoryError::MissingConfig("data directory not found".to_string()))?;
        Ok(data_dir.join("skm"))
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_dir())
}
