use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};
use crate::search::SemanticIndex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, memory_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKM_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(memory_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("skm/config.toml"))
    }

    fn load_project(memory_root: &Path) -> Result<Option<ConfigPatch>> {
        let path = memory_root.join("config.toml");
        Self::load_patch(&path)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| MemoryError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| MemoryError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.memory {
            self.memory.merge(patch);
        }
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.analytics {
            self.analytics.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("SKM_DATABASE") {
            self.memory.database = value;
        }

        if let Some(value) = env_bool("SKM_SEARCH_USE_EMBEDDINGS") {
            self.search.use_embeddings = value;
        }
        if let Some(value) = env_string("SKM_SEARCH_EMBEDDING_BACKEND") {
            self.search.embedding_backend = value;
        }
        if let Some(value) = env_usize("SKM_SEARCH_EMBEDDING_DIMS")? {
            self.search.embedding_dims = value;
        }
        if let Some(value) = env_f32("SKM_SEARCH_LEXICAL_WEIGHT")? {
            self.search.lexical_weight = value;
        }
        if let Some(value) = env_f32("SKM_SEARCH_SEMANTIC_WEIGHT")? {
            self.search.semantic_weight = value;
        }
        if let Some(value) = env_f32("SKM_SEARCH_USAGE_WEIGHT")? {
            self.search.usage_weight = value;
        }
        if let Some(value) = env_u32("SKM_SEARCH_USAGE_CEILING")? {
            self.search.usage_ceiling = value;
        }
        if let Some(value) = env_usize("SKM_SEARCH_OVERFETCH_FACTOR")? {
            self.search.overfetch_factor = value;
        }
        if let Some(value) = env_usize("SKM_SEARCH_MIN_CANDIDATES")? {
            self.search.min_candidates = value;
        }

        if let Some(value) = env_f32("SKM_ANALYTICS_DEDUP_THRESHOLD")? {
            self.analytics.dedup_threshold = value;
        }
        if let Some(value) = env_usize("SKM_ANALYTICS_MAX_PAIRS")? {
            self.analytics.max_pairs = value;
        }
        if let Some(value) = env_u32("SKM_ANALYTICS_STALE_AFTER_DAYS")? {
            self.analytics.stale_after_days = value;
        }
        if let Some(value) = env_usize("SKM_ANALYTICS_MIN_PROJECT_COUNT")? {
            self.analytics.min_project_count = value;
        }
        if let Some(value) = env_usize("SKM_ANALYTICS_CONFLICT_MAX_PAIRS")? {
            self.analytics.conflict_max_pairs = value;
        }

        if let Some(value) = env_usize("SKM_CACHE_QUERY_EMBEDDINGS")? {
            self.cache.query_embeddings = value;
        }
        if let Some(value) = env_usize("SKM_CACHE_SKILL_EMBEDDINGS")? {
            self.cache.skill_embeddings = value;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Memory root; resolved by the app when unset
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub database: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            root: None,
            database: crate::storage::DEFAULT_DATABASE.to_string(),
        }
    }
}

impl MemoryConfig {
    fn merge(&mut self, patch: MemoryPatch) {
        if let Some(value) = patch.root {
            self.root = Some(value);
        }
        if let Some(value) = patch.database {
            self.database = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub use_embeddings: bool,
    /// `hash` or `none`
    #[serde(default)]
    pub embedding_backend: String,
    #[serde(default)]
    pub embedding_dims: usize,
    #[serde(default)]
    pub lexical_weight: f32,
    #[serde(default)]
    pub semantic_weight: f32,
    #[serde(default)]
    pub usage_weight: f32,
    #[serde(default)]
    pub usage_ceiling: u32,
    #[serde(default)]
    pub overfetch_factor: usize,
    #[serde(default)]
    pub min_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            use_embeddings: true,
            embedding_backend: "hash".to_string(),
            embedding_dims: 384,
            lexical_weight: 0.4,
            semantic_weight: 0.4,
            usage_weight: 0.2,
            usage_ceiling: 10,
            overfetch_factor: 5,
            min_candidates: 50,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.use_embeddings {
            self.use_embeddings = value;
        }
        if let Some(value) = patch.embedding_backend {
            self.embedding_backend = value;
        }
        if let Some(value) = patch.embedding_dims {
            self.embedding_dims = value;
        }
        if let Some(value) = patch.lexical_weight {
            self.lexical_weight = value;
        }
        if let Some(value) = patch.semantic_weight {
            self.semantic_weight = value;
        }
        if let Some(value) = patch.usage_weight {
            self.usage_weight = value;
        }
        if let Some(value) = patch.usage_ceiling {
            self.usage_ceiling = value;
        }
        if let Some(value) = patch.overfetch_factor {
            self.overfetch_factor = value;
        }
        if let Some(value) = patch.min_candidates {
            self.min_candidates = value;
        }
    }

    /// Semantic index for the configured backend.
    pub fn semantic_index(&self) -> Result<SemanticIndex> {
        if !self.use_embeddings {
            return Ok(SemanticIndex::disabled());
        }
        match self.embedding_backend.as_str() {
            "hash" => Ok(SemanticIndex::hashed(self.embedding_dims)),
            "none" | "" => Ok(SemanticIndex::disabled()),
            other => Err(MemoryError::Config(format!(
                "unknown embedding backend '{other}' (expected 'hash' or 'none')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub dedup_threshold: f32,
    #[serde(default)]
    pub max_pairs: usize,
    #[serde(default)]
    pub stale_after_days: u32,
    #[serde(default)]
    pub min_project_count: usize,
    #[serde(default)]
    pub conflict_max_pairs: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: crate::analytics::dedup::DEFAULT_SIMILARITY_THRESHOLD,
            max_pairs: crate::analytics::dedup::DEFAULT_MAX_PAIRS,
            stale_after_days: crate::analytics::staleness::DEFAULT_REVIEW_AFTER_DAYS,
            min_project_count: crate::analytics::promotion::DEFAULT_MIN_PROJECT_COUNT,
            conflict_max_pairs: crate::analytics::conflicts::DEFAULT_MAX_PAIRS,
        }
    }
}

impl AnalyticsConfig {
    fn merge(&mut self, patch: AnalyticsPatch) {
        if let Some(value) = patch.dedup_threshold {
            self.dedup_threshold = value;
        }
        if let Some(value) = patch.max_pairs {
            self.max_pairs = value;
        }
        if let Some(value) = patch.stale_after_days {
            self.stale_after_days = value;
        }
        if let Some(value) = patch.min_project_count {
            self.min_project_count = value;
        }
        if let Some(value) = patch.conflict_max_pairs {
            self.conflict_max_pairs = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub query_embeddings: usize,
    #[serde(default)]
    pub skill_embeddings: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            query_embeddings: crate::search::cache::DEFAULT_QUERY_CACHE_SIZE,
            skill_embeddings: crate::search::cache::DEFAULT_SKILL_CACHE_SIZE,
        }
    }
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.query_embeddings {
            self.query_embeddings = value;
        }
        if let Some(value) = patch.skill_embeddings {
            self.skill_embeddings = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub memory: Option<MemoryPatch>,
    pub search: Option<SearchPatch>,
    pub analytics: Option<AnalyticsPatch>,
    pub cache: Option<CachePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MemoryPatch {
    pub root: Option<PathBuf>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub use_embeddings: Option<bool>,
    pub embedding_backend: Option<String>,
    pub embedding_dims: Option<usize>,
    pub lexical_weight: Option<f32>,
    pub semantic_weight: Option<f32>,
    pub usage_weight: Option<f32>,
    pub usage_ceiling: Option<u32>,
    pub overfetch_factor: Option<usize>,
    pub min_candidates: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AnalyticsPatch {
    pub dedup_threshold: Option<f32>,
    pub max_pairs: Option<usize>,
    pub stale_after_days: Option<u32>,
    pub min_project_count: Option<usize>,
    pub conflict_max_pairs: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachePatch {
    pub query_embeddings: Option<usize>,
    pub skill_embeddings: Option<usize>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u32>().map(Some).map_err(|err| {
            MemoryError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<usize>().map(Some).map_err(|err| {
            MemoryError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_f32(key: &str) -> Result<Option<f32>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<f32>().map(Some).map_err(|err| {
            MemoryError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}
