//! Loading paginated source documents.
//!
//! Knowledge sources are shipped either as PDF files or as plain text with
//! form-feed page breaks. Both are reduced to the same shape: an ordered
//! sequence of page texts.

use std::path::Path;

use tracing::{debug, info};

use crate::document::{Page, SourceDocument};
use crate::error::{KbError, Result};

/// Page separator in extracted text. `pdftotext`-style extractors emit one
/// form feed per page break; plain-text sources may use the same convention.
const PAGE_BREAK: char = '\u{0c}';

/// Loads a paginated document from disk.
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a source document and split it into pages.
    ///
    /// PDF files are passed through text extraction; any other extension is
    /// read as UTF-8 text. Pages are separated by form feeds; a file without
    /// form feeds is a single page. Blank pages are dropped but keep their
    /// position in the page numbering.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::DocumentNotFound`] if `path` does not exist, and
    /// [`KbError::DocumentUnreadable`] if the file cannot be parsed or
    /// contains no text.
    pub fn load(path: impl AsRef<Path>) -> Result<SourceDocument> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KbError::DocumentNotFound { path: path.display().to_string() });
        }

        let extension =
            path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();

        let raw = match extension.as_str() {
            "pdf" => pdf_extract::extract_text(path).map_err(|e| KbError::DocumentUnreadable {
                path: path.display().to_string(),
                message: e.to_string(),
            })?,
            _ => std::fs::read_to_string(path).map_err(|e| KbError::DocumentUnreadable {
                path: path.display().to_string(),
                message: e.to_string(),
            })?,
        };

        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let pages: Vec<Page> = raw
            .split(PAGE_BREAK)
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| Page { number: i + 1, text: text.to_string() })
            .collect();

        if pages.is_empty() {
            return Err(KbError::DocumentUnreadable {
                path: path.display().to_string(),
                message: "document contains no text".to_string(),
            });
        }

        debug!(document.id = %id, page_count = pages.len(), "loaded document");
        Ok(SourceDocument { id, pages })
    }
}

/// Load a document and split it into chunks in one step.
///
/// Convenience composition of [`DocumentLoader::load`] and a
/// [`Chunker`](crate::Chunker).
pub fn load_and_chunk(
    path: impl AsRef<Path>,
    chunker: &dyn crate::Chunker,
) -> Result<Vec<crate::document::Chunk>> {
    let document = DocumentLoader::load(path)?;
    let chunks = chunker.chunk(&document);
    info!(document.id = %document.id, chunk_count = chunks.len(), "chunked document");
    Ok(chunks)
}
