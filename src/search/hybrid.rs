//! Hybrid retrieval: lexical candidates reranked with semantic and usage signals
//!
//! Stage one pulls a bounded candidate set from the FTS5 index. Stage two
//! scores only those candidates:
//!
//! ```text
//! fused = (w_lex * lex / max_lex + w_sem * cosine + w_use * min(reuse / ceiling, 1))
//!         / (w_lex + w_sem + w_use)
//! ```
//!
//! A candidate without a vector drops the semantic term from both the sum and
//! the divisor, so a missing embedding never reads as "irrelevant".

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::SearchConfig;
use crate::core::SkillRecord;
use crate::error::Result;
use crate::search::cache::EmbeddingCache;
use crate::search::embeddings::cosine_similarity;
use crate::search::lexical;
use crate::search::semantic::{self, SemanticIndex, content_hash};
use crate::storage::CorpusStore;

/// Relative weights of the fused signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub lexical: f32,
    pub semantic: f32,
    pub usage: f32,
    /// `reuse_count` at which the usage signal saturates
    pub usage_ceiling: u32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            lexical: 0.4,
            semantic: 0.4,
            usage: 0.2,
            usage_ceiling: 10,
        }
    }
}

impl FusionWeights {
    #[must_use]
    pub fn usage_signal(&self, reuse_count: u32) -> f32 {
        if self.usage_ceiling == 0 {
            return if reuse_count > 0 { 1.0 } else { 0.0 };
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = reuse_count as f32 / self.usage_ceiling as f32;
        ratio.min(1.0)
    }

    /// Combine signals; `semantic = None` excludes its weight entirely.
    #[must_use]
    pub fn fuse(&self, lexical: f32, semantic: Option<f32>, usage: f32) -> f32 {
        let mut total = self.lexical * lexical + self.usage * usage;
        let mut weight = self.lexical + self.usage;
        if let Some(semantic) = semantic {
            total += self.semantic * semantic;
            weight += self.semantic;
        }
        if weight > 0.0 { total / weight } else { lexical }
    }
}

/// Candidate-set sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieverOptions {
    pub overfetch_factor: usize,
    pub min_candidates: usize,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            overfetch_factor: 5,
            min_candidates: 50,
        }
    }
}

impl RetrieverOptions {
    #[must_use]
    pub fn width(&self, top_k: usize) -> usize {
        top_k
            .saturating_mul(self.overfetch_factor.max(1))
            .max(self.min_candidates)
    }
}

/// One ranked result with its score breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct HybridResult {
    pub record: SkillRecord,
    /// Raw BM25 relevance (higher is better)
    pub lexical_score: f32,
    pub normalized_lexical: f32,
    pub semantic_score: Option<f32>,
    pub usage_score: f32,
    pub score: f32,
}

pub struct HybridRetriever {
    store: Arc<CorpusStore>,
    weights: FusionWeights,
    options: RetrieverOptions,
    cache: EmbeddingCache,
}

impl HybridRetriever {
    #[must_use]
    pub fn new(store: Arc<CorpusStore>) -> Self {
        Self {
            store,
            weights: FusionWeights::default(),
            options: RetrieverOptions::default(),
            cache: EmbeddingCache::new(),
        }
    }

    /// Retriever tuned from the `[search]` and `[cache]` config sections.
    #[must_use]
    pub fn from_config(store: Arc<CorpusStore>, search: &SearchConfig, cache: EmbeddingCache) -> Self {
        Self {
            store,
            weights: FusionWeights {
                lexical: search.lexical_weight,
                semantic: search.semantic_weight,
                usage: search.usage_weight,
                usage_ceiling: search.usage_ceiling,
            },
            options: RetrieverOptions {
                overfetch_factor: search.overfetch_factor,
                min_candidates: search.min_candidates,
            },
            cache,
        }
    }

    #[must_use]
    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RetrieverOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Ranked search using every available signal.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<HybridResult>> {
        self.run(query, top_k, true)
    }

    /// Ranked search on normalized lexical score alone.
    pub fn search_lexical(&self, query: &str, top_k: usize) -> Result<Vec<HybridResult>> {
        self.run(query, top_k, false)
    }

    fn run(&self, query: &str, top_k: usize, use_semantic: bool) -> Result<Vec<HybridResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let width = self.options.width(top_k);
        let semantic = self.store.semantic();

        let (hits, records, stored) = self.store.with_reader(|conn| {
            let hits = lexical::search(conn, query, width)?;
            let ids: Vec<String> = hits.iter().map(|(id, _)| id.clone()).collect();
            let records = crate::storage::store::records_by_id(conn, &ids)?;
            let stored = if use_semantic && semantic.is_available() {
                semantic::load_many(conn, &ids)?
            } else {
                HashMap::new()
            };
            Ok((hits, records, stored))
        })?;

        if hits.is_empty() {
            return Ok(Vec::new());
        }
        let max_lexical = hits.iter().map(|(_, s)| *s).fold(f32::MIN, f32::max);
        tracing::debug!(query, candidates = hits.len(), "lexical candidates");

        let query_vector = if use_semantic {
            self.query_vector(semantic, query)
        } else {
            None
        };

        let mut results: Vec<HybridResult> = hits
            .into_iter()
            .filter_map(|(skill_id, lexical_score)| {
                let record = records.get(&skill_id)?.clone();
                let normalized_lexical = if max_lexical > 0.0 {
                    lexical_score / max_lexical
                } else {
                    0.0
                };
                let Some(query_vector) = query_vector.as_deref() else {
                    return Some(HybridResult {
                        record,
                        lexical_score,
                        normalized_lexical,
                        semantic_score: None,
                        usage_score: 0.0,
                        score: normalized_lexical,
                    });
                };

                let usage_score = self.weights.usage_signal(record.reuse_count);
                let semantic_score = self
                    .candidate_vector(semantic, &record, stored.get(&skill_id))
                    .map(|vector| cosine_similarity(query_vector, &vector));
                let score = self
                    .weights
                    .fuse(normalized_lexical, semantic_score, usage_score);
                Some(HybridResult {
                    record,
                    lexical_score,
                    normalized_lexical,
                    semantic_score,
                    usage_score,
                    score,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.record.skill_id.cmp(&b.record.skill_id))
        });
        results.truncate(top_k);
        Ok(results)
    }

    /// Query vector, or `None` to fall back to lexical-only ranking.
    fn query_vector(&self, semantic: &SemanticIndex, query: &str) -> Option<Vec<f32>> {
        if !semantic.is_available() {
            return None;
        }
        if let Some(vector) = self.cache.get_query(query) {
            return Some(vector);
        }
        match semantic.embed(query) {
            Ok(vector) => {
                self.cache.put_query(query, vector.clone());
                Some(vector)
            }
            Err(err) => {
                tracing::warn!(error = %err, "query embedding failed, ranking lexically");
                None
            }
        }
    }

    /// Stored vector when current, else a lazily computed one (not persisted).
    fn candidate_vector(
        &self,
        semantic: &SemanticIndex,
        record: &SkillRecord,
        stored: Option<&semantic::StoredEmbedding>,
    ) -> Option<Vec<f32>> {
        let text = record.semantic_text();
        let hash = content_hash(&text);
        let model = semantic.model_id()?;

        if let Some(stored) = stored {
            if stored.content_hash == hash && stored.model == model {
                return Some(stored.vector.clone());
            }
        }
        if let Some(vector) = self.cache.get_skill(&record.skill_id, &hash) {
            return Some(vector);
        }
        match semantic.embed(&text) {
            Ok(vector) => {
                self.cache.put_skill(&record.skill_id, &hash, vector.clone());
                Some(vector)
            }
            Err(err) => {
                tracing::debug!(skill_id = %record.skill_id, error = %err, "no vector for candidate");
                None
            }
        }
    }
}
