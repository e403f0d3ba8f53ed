//! Search engine for skills
//!
//! Implements hybrid search: FTS5 BM25 candidates reranked with embedding
//! similarity and a saturating usage signal.

pub mod cache;
pub mod embeddings;
pub mod hybrid;
pub mod lexical;
pub mod semantic;

pub use cache::{CacheStats, EmbeddingCache};
pub use embeddings::{Embedder, HashEmbedder, cosine_similarity};
pub use hybrid::{FusionWeights, HybridResult, HybridRetriever, RetrieverOptions};
pub use semantic::{EmbedOutcome, SemanticIndex, content_hash};
