//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], which
//! splits each page of a document into fixed-size pieces with a configurable
//! overlap between consecutive pieces of the same page.

use crate::document::{Chunk, SourceDocument};

/// A strategy for splitting a loaded document into chunks.
///
/// Implementations produce [`Chunk`]s with text and provenance but no
/// embeddings; vectors are attached later by the build step.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks, in page order.
    ///
    /// Returns an empty `Vec` if the document has no pages.
    fn chunk(&self, document: &SourceDocument) -> Vec<Chunk>;
}

/// Splits page text into fixed-size chunks with a fixed overlap.
///
/// Sizes are counted in Unicode scalar values, so a chunk boundary can never
/// split a code point. Boundaries do not respect word breaks. Chunks never
/// span pages: each page's text stream is split independently, and every
/// chunk records the page it was cut from.
///
/// The final chunk of a page may be shorter than `chunk_size`; no redundant
/// tail chunk is emitted once the page is fully covered.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of characters shared between consecutive
    ///   chunks of the same page
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &SourceDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0;

        for page in &document.pages {
            let chars: Vec<char> = page.text.chars().collect();
            if chars.is_empty() {
                continue;
            }

            let mut start = 0;
            loop {
                let end = (start + self.chunk_size).min(chars.len());
                let text: String = chars[start..end].iter().collect();

                chunks.push(Chunk {
                    id: format!("{}_{chunk_index}", document.id),
                    text,
                    page: page.number,
                    document_id: document.id.clone(),
                    chunk_index,
                });
                chunk_index += 1;

                if end == chars.len() {
                    break;
                }
                let step = self.chunk_size.saturating_sub(self.chunk_overlap);
                if step == 0 {
                    break;
                }
                start += step;
            }
        }

        chunks
    }
}
