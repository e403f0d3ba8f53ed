//! Semantic index: persisted embedding vectors with content-hash invalidation
//!
//! Vectors live in the `skill_embeddings` table next to the lexical index, so
//! the store can write them inside the same transaction as the record. The
//! backend is an explicit capability; every caller handles its absence.

use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};

use crate::error::{MemoryError, Result};
use crate::search::embeddings::{Embedder, HashEmbedder, decode_vector, encode_vector};

/// What `embed_and_cache` did for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedOutcome {
    /// Stored vector already matched the content hash and model
    Reused,
    Embedded,
    /// No backend configured
    Skipped,
    /// Backend failed; any stale vector was dropped
    Degraded,
}

/// A vector read back from the cache table.
#[derive(Debug, Clone)]
pub struct StoredEmbedding {
    pub vector: Vec<f32>,
    pub model: String,
    pub content_hash: String,
}

#[derive(Clone)]
pub struct SemanticIndex {
    backend: Option<Arc<dyn Embedder>>,
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("model", &self.model_id())
            .finish()
    }
}

impl SemanticIndex {
    /// Index without an embedding backend: lexical-only operation.
    #[must_use]
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    #[must_use]
    pub fn with_backend(backend: Arc<dyn Embedder>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Built-in hash embedder of the given dimensionality.
    #[must_use]
    pub fn hashed(dims: usize) -> Self {
        Self::with_backend(Arc::new(HashEmbedder::new(dims)))
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    #[must_use]
    pub fn model_id(&self) -> Option<&str> {
        self.backend.as_deref().map(Embedder::model_id)
    }

    /// Embed arbitrary text with the configured backend.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let backend = self
            .backend
            .as_deref()
            .ok_or_else(|| MemoryError::IndexUnavailable("no embedding backend".to_string()))?;
        backend
            .embed(text)
            .map_err(|err| MemoryError::IndexUnavailable(err.to_string()))
    }

    /// Compute or reuse the vector for `skill_id`, keyed by content hash.
    ///
    /// Backend failure is not an error: the stale vector (if any) is removed
    /// so that the semantic signal reads as absent rather than outdated.
    pub fn embed_and_cache(
        &self,
        conn: &Connection,
        skill_id: &str,
        text: &str,
    ) -> Result<EmbedOutcome> {
        let Some(backend) = self.backend.as_deref() else {
            return Ok(EmbedOutcome::Skipped);
        };

        let hash = content_hash(text);
        if let Some((stored_hash, model)) = stored_fingerprint(conn, skill_id)? {
            if stored_hash == hash && model == backend.model_id() {
                tracing::debug!(skill_id, "embedding cache hit");
                return Ok(EmbedOutcome::Reused);
            }
        }

        match backend.embed(text) {
            Ok(vector) => {
                conn.execute(
                    "INSERT OR REPLACE INTO skill_embeddings
                     (skill_id, embedding, model, content_hash, generated_at)
                     VALUES (?, ?, ?, ?, ?)",
                    params![
                        skill_id,
                        encode_vector(&vector),
                        backend.model_id(),
                        hash,
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )?;
                tracing::debug!(skill_id, model = backend.model_id(), "embedding stored");
                Ok(EmbedOutcome::Embedded)
            }
            Err(err) => {
                tracing::warn!(skill_id, error = %err, "embedding backend unavailable, semantic entry dropped");
                delete_entry(conn, skill_id)?;
                Ok(EmbedOutcome::Degraded)
            }
        }
    }

    /// Stored vector for `skill_id` if it is current for `text` and this backend.
    pub fn current_vector(
        &self,
        conn: &Connection,
        skill_id: &str,
        text: &str,
    ) -> Result<Option<Vec<f32>>> {
        let Some(model) = self.model_id() else {
            return Ok(None);
        };
        Ok(load(conn, skill_id)?
            .filter(|stored| stored.model == model && stored.content_hash == content_hash(text))
            .map(|stored| stored.vector))
    }
}

/// SHA-256 hex digest of the embedded text.
#[must_use]
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn stored_fingerprint(conn: &Connection, skill_id: &str) -> Result<Option<(String, String)>> {
    Ok(conn
        .query_row(
            "SELECT content_hash, model FROM skill_embeddings WHERE skill_id = ?",
            [skill_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?)
}

pub fn load(conn: &Connection, skill_id: &str) -> Result<Option<StoredEmbedding>> {
    let row: Option<(Vec<u8>, String, String)> = conn
        .query_row(
            "SELECT embedding, model, content_hash FROM skill_embeddings WHERE skill_id = ?",
            [skill_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    row.map(|(blob, model, content_hash)| {
        Ok(StoredEmbedding {
            vector: decode_vector(&blob)?,
            model,
            content_hash,
        })
    })
    .transpose()
}

/// Load stored vectors for a set of ids; ids without a vector are absent.
pub fn load_many(conn: &Connection, skill_ids: &[String]) -> Result<HashMap<String, StoredEmbedding>> {
    let mut found = HashMap::with_capacity(skill_ids.len());
    for skill_id in skill_ids {
        if let Some(stored) = load(conn, skill_id)? {
            found.insert(skill_id.clone(), stored);
        }
    }
    Ok(found)
}

pub fn delete_entry(conn: &Connection, skill_id: &str) -> Result<()> {
    conn.execute("DELETE FROM skill_embeddings WHERE skill_id = ?", [skill_id])?;
    Ok(())
}

pub fn clear(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM skill_embeddings", [])?;
    Ok(())
}

/// Drop vectors whose record no longer exists. Returns the number removed.
pub fn prune_orphans(conn: &Connection) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM skill_embeddings
         WHERE skill_id NOT IN (SELECT skill_id FROM skills_meta)",
        [],
    )?;
    Ok(removed)
}

pub fn count(conn: &Connection) -> Result<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM skill_embeddings", [], |row| row.get(0))?;
    Ok(usize::try_from(n).unwrap_or(0))
}
