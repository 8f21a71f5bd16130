//! Persistent vector index store.
//!
//! One index per namespace, persisted as a single JSON snapshot under the
//! store's root directory. A build fully replaces the previous snapshot via
//! write-then-rename, so a concurrent loader can never observe a partially
//! written index. A loaded [`IndexHandle`] is immutable; searches against it
//! are pure reads and need no synchronization.
//!
//! The snapshot is treated strictly as data: it is deserialized with serde,
//! versioned, and validated against the current embedder's model identity
//! and dimensionality before any of it is used.

use std::cmp::Ordering;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{error, info};

use crate::document::{Chunk, RetrievedChunk};
use crate::error::{KbError, Result};

/// Version tag of the persisted snapshot layout.
const FORMAT_VERSION: u32 = 1;

/// A chunk paired with its embedding vector, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// The on-disk form of one namespace's index.
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    format_version: u32,
    model: String,
    dimensions: usize,
    chunks: Vec<StoredChunk>,
}

/// A store of persisted vector indexes, one per namespace, rooted at a
/// directory on disk.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// build.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The path a namespace's snapshot is persisted at.
    pub fn index_path(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }

    /// Check whether a persisted index is present, without loading it.
    pub async fn exists(&self, namespace: &str) -> bool {
        if validate_namespace(namespace).is_err() {
            return false;
        }
        fs::try_exists(self.index_path(namespace)).await.unwrap_or(false)
    }

    /// Build and persist the index for `namespace` from chunk/vector pairs,
    /// atomically replacing any prior index with the same namespace.
    ///
    /// `model` and `dimensions` identify the embedder the vectors came from;
    /// they are persisted so [`load`](IndexStore::load) can reject a stale
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::Config`] if the namespace is invalid, the chunk and
    /// vector counts differ, or any vector has the wrong dimensionality.
    pub async fn build(
        &self,
        namespace: &str,
        model: &str,
        dimensions: usize,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<()> {
        validate_namespace(namespace)?;

        if chunks.len() != vectors.len() {
            return Err(KbError::Config(format!(
                "chunk count ({}) does not match vector count ({})",
                chunks.len(),
                vectors.len()
            )));
        }
        for (chunk, vector) in chunks.iter().zip(&vectors) {
            if vector.len() != dimensions {
                return Err(KbError::Config(format!(
                    "vector for chunk '{}' has {} dimensions, expected {dimensions}",
                    chunk.id,
                    vector.len()
                )));
            }
        }

        let snapshot = IndexSnapshot {
            format_version: FORMAT_VERSION,
            model: model.to_string(),
            dimensions,
            chunks: chunks
                .into_iter()
                .zip(vectors)
                .map(|(chunk, embedding)| StoredChunk { chunk, embedding })
                .collect(),
        };

        let data = serde_json::to_vec(&snapshot).map_err(|e| {
            KbError::Config(format!("failed to serialize index snapshot: {e}"))
        })?;

        fs::create_dir_all(&self.root).await.map_err(|e| {
            KbError::Config(format!("failed to create index directory: {e}"))
        })?;

        // Write-then-rename: a concurrent load sees either the old snapshot
        // or the new one, never a partial file.
        let final_path = self.index_path(namespace);
        let tmp_path = self.root.join(format!("{namespace}.json.tmp"));
        fs::write(&tmp_path, &data).await.map_err(|e| {
            KbError::Config(format!("failed to write index snapshot: {e}"))
        })?;
        fs::rename(&tmp_path, &final_path).await.map_err(|e| {
            KbError::Config(format!("failed to replace index snapshot: {e}"))
        })?;

        info!(namespace, chunk_count = snapshot.chunks.len(), "built index");
        Ok(())
    }

    /// Restore the persisted index for `namespace` into memory.
    ///
    /// `expected_model` and `expected_dimensions` come from the embedder the
    /// caller will query with; a snapshot built against anything else is
    /// rejected rather than allowed to produce corrupted distances.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::IndexNotFound`] if no snapshot exists, and
    /// [`KbError::IndexCorrupt`] if it cannot be deserialized or disagrees
    /// with the expected model identity or dimensionality.
    pub async fn load(
        &self,
        namespace: &str,
        expected_model: &str,
        expected_dimensions: usize,
    ) -> Result<IndexHandle> {
        validate_namespace(namespace)?;

        let path = self.index_path(namespace);
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KbError::IndexNotFound { namespace: namespace.to_string() }
            } else {
                KbError::IndexCorrupt {
                    namespace: namespace.to_string(),
                    message: format!("failed to read snapshot: {e}"),
                }
            }
        })?;

        let snapshot: IndexSnapshot = serde_json::from_slice(&data).map_err(|e| {
            error!(namespace, error = %e, "failed to deserialize index snapshot");
            KbError::IndexCorrupt {
                namespace: namespace.to_string(),
                message: format!("failed to deserialize snapshot: {e}"),
            }
        })?;

        if snapshot.format_version != FORMAT_VERSION {
            return Err(KbError::IndexCorrupt {
                namespace: namespace.to_string(),
                message: format!("unsupported snapshot version {}", snapshot.format_version),
            });
        }
        if snapshot.dimensions != expected_dimensions {
            return Err(KbError::IndexCorrupt {
                namespace: namespace.to_string(),
                message: format!(
                    "snapshot has {} dimensions, current embedder produces {expected_dimensions}",
                    snapshot.dimensions
                ),
            });
        }
        if snapshot.model != expected_model {
            return Err(KbError::IndexCorrupt {
                namespace: namespace.to_string(),
                message: format!(
                    "snapshot was built with model '{}', current embedder is '{expected_model}'",
                    snapshot.model
                ),
            });
        }
        if let Some(bad) =
            snapshot.chunks.iter().find(|s| s.embedding.len() != snapshot.dimensions)
        {
            return Err(KbError::IndexCorrupt {
                namespace: namespace.to_string(),
                message: format!(
                    "chunk '{}' has a {}-dimensional embedding, snapshot declares {}",
                    bad.chunk.id,
                    bad.embedding.len(),
                    snapshot.dimensions
                ),
            });
        }

        info!(namespace, chunk_count = snapshot.chunks.len(), "loaded index");
        Ok(IndexHandle {
            namespace: namespace.to_string(),
            dimensions: snapshot.dimensions,
            entries: snapshot.chunks,
        })
    }
}

/// Namespaces name files under the store root, so they are restricted to a
/// conservative character set.
fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(KbError::Config("namespace must not be empty".to_string()));
    }
    if !namespace.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(KbError::Config(format!(
            "namespace '{namespace}' contains characters outside [A-Za-z0-9_-]"
        )));
    }
    Ok(())
}

/// An immutable, in-memory index restored from a snapshot.
///
/// Entries keep their insertion order, which is also the search tie-break
/// order. Once loaded, a handle is a pure read structure and may be shared
/// across concurrent searchers freely.
#[derive(Debug)]
pub struct IndexHandle {
    namespace: String,
    dimensions: usize,
    entries: Vec<StoredChunk>,
}

impl IndexHandle {
    /// The namespace this handle was loaded from.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of chunks in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// Similarity is cosine, the same metric the vectors were built for.
    /// Ties are broken by insertion order. If the index holds fewer than `k`
    /// chunks, all of them are returned.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::SearchInput`] if `k` is zero or `query` has the
    /// wrong dimensionality. Invalid input is never reported as an empty
    /// result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(KbError::SearchInput("k must be greater than zero".to_string()));
        }
        if query.len() != self.dimensions {
            return Err(KbError::SearchInput(format!(
                "query vector has {} dimensions, index expects {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<RetrievedChunk> = self
            .entries
            .iter()
            .map(|entry| RetrievedChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, query),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_validation() {
        assert!(validate_namespace("reward_guide").is_ok());
        assert!(validate_namespace("parivartana-kb-2").is_ok());
        assert!(validate_namespace("").is_err());
        assert!(validate_namespace("../escape").is_err());
        assert!(validate_namespace("a/b").is_err());
        assert!(validate_namespace("with space").is_err());
    }

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let similarity = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
