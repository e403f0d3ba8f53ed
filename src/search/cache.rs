//! LRU caching layer for embedding vectors.
//!
//! Provides caching for:
//! - Query embeddings (avoid re-embedding repeated queries)
//! - Skill embeddings computed lazily at search time (the store is the
//!   durable cache; these are never written back)
//!
//! Cache sizes are configurable and default to reasonable limits that
//! balance memory usage with hit rates for typical workloads.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Default cache size for query embeddings (number of queries)
pub const DEFAULT_QUERY_CACHE_SIZE: usize = 128;

/// Default cache size for skill embeddings (number of skills)
pub const DEFAULT_SKILL_CACHE_SIZE: usize = 1024;

/// Embedding cache entry.
#[derive(Debug, Clone)]
struct CachedEmbedding {
    embedding: Vec<f32>,
    /// Content hash used to generate this embedding
    content_hash: String,
}

/// Cache statistics for monitoring and tuning.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub query_hits: u64,
    pub query_misses: u64,
    pub skill_hits: u64,
    pub skill_misses: u64,
}

impl CacheStats {
    /// Calculate query cache hit rate.
    #[must_use]
    pub fn query_hit_rate(&self) -> f64 {
        hit_rate(self.query_hits, self.query_misses)
    }

    /// Calculate skill embedding cache hit rate.
    #[must_use]
    pub fn skill_hit_rate(&self) -> f64 {
        hit_rate(self.skill_hits, self.skill_misses)
    }
}

#[allow(clippy::cast_precision_loss)]
fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Thread-safe LRU cache of embedding vectors.
///
/// Caches are protected by mutexes for concurrent access.
/// All cache operations are non-blocking (try-lock pattern): a contended
/// lookup is treated as a miss and a contended insert is dropped.
pub struct EmbeddingCache {
    /// Query text -> embedding
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
    /// Skill ID -> embedding tagged with its content hash
    skill_cache: Mutex<LruCache<String, CachedEmbedding>>,
    stats: Mutex<CacheStats>,
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingCache {
    /// Create a new cache with default sizes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sizes(DEFAULT_QUERY_CACHE_SIZE, DEFAULT_SKILL_CACHE_SIZE)
    }

    /// Create a new cache with custom sizes (zero is raised to one).
    #[must_use]
    pub fn with_sizes(query_size: usize, skill_size: usize) -> Self {
        Self {
            query_cache: Mutex::new(LruCache::new(capacity(query_size))),
            skill_cache: Mutex::new(LruCache::new(capacity(skill_size))),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Get the cached embedding for a query.
    pub fn get_query(&self, query: &str) -> Option<Vec<f32>> {
        let mut cache = self.query_cache.try_lock().ok()?;
        let hit = cache.get(query).cloned();
        if let Ok(mut stats) = self.stats.try_lock() {
            if hit.is_some() {
                stats.query_hits += 1;
            } else {
                stats.query_misses += 1;
            }
        }
        hit
    }

    pub fn put_query(&self, query: &str, embedding: Vec<f32>) {
        if let Ok(mut cache) = self.query_cache.try_lock() {
            cache.put(query.to_string(), embedding);
        }
    }

    /// Get cached embedding for a skill.
    ///
    /// Returns None if not cached, hash mismatch, or cache is locked.
    pub fn get_skill(&self, skill_id: &str, content_hash: &str) -> Option<Vec<f32>> {
        let mut cache = self.skill_cache.try_lock().ok()?;
        let hit = cache
            .get(skill_id)
            .filter(|entry| entry.content_hash == content_hash)
            .map(|entry| entry.embedding.clone());
        if let Ok(mut stats) = self.stats.try_lock() {
            if hit.is_some() {
                stats.skill_hits += 1;
            } else {
                stats.skill_misses += 1;
            }
        }
        hit
    }

    pub fn put_skill(&self, skill_id: &str, content_hash: &str, embedding: Vec<f32>) {
        if let Ok(mut cache) = self.skill_cache.try_lock() {
            cache.put(
                skill_id.to_string(),
                CachedEmbedding {
                    embedding,
                    content_hash: content_hash.to_string(),
                },
            );
        }
    }

    /// Get current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .try_lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Clear all caches.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.query_cache.try_lock() {
            cache.clear();
        }
        if let Ok(mut cache) = self.skill_cache.try_lock() {
            cache.clear();
        }
        if let Ok(mut stats) = self.stats.try_lock() {
            *stats = CacheStats::default();
        }
    }

    /// Get the current number of entries in each cache.
    pub fn sizes(&self) -> (usize, usize) {
        let query = self.query_cache.try_lock().map(|c| c.len()).unwrap_or(0);
        let skill = self.skill_cache.try_lock().map(|c| c.len()).unwrap_or(0);
        (query, skill)
    }
}

fn capacity(size: usize) -> NonZeroUsize {
    NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
}
