//! Data types for source documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// One page of a [`SourceDocument`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number within the source document.
    pub number: usize,
    /// The raw text of the page.
    pub text: String,
}

/// A loaded source document: an ordered sequence of pages.
///
/// Produced by [`DocumentLoader`](crate::DocumentLoader) at build time,
/// consumed by a [`Chunker`](crate::Chunker), and discarded afterwards.
/// Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Identifier derived from the source file name.
    pub id: String,
    /// The pages of the document, in order.
    pub pages: Vec<Page>,
}

/// A segment of one page of a [`SourceDocument`].
///
/// Chunk IDs are `{document_id}_{chunk_index}`. The `chunk_index` records
/// insertion order across the whole document and is what makes search
/// tie-breaking stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The page the chunk was cut from.
    pub page: usize,
    /// The ID of the parent [`SourceDocument`].
    pub document_id: String,
    /// Position of the chunk in document order, starting at 0.
    pub chunk_index: usize,
}

/// A retrieved [`Chunk`] paired with a similarity score.
///
/// Ephemeral, per-query; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}
