//! Property tests for the fixed-size chunker.

use mitra_rag::chunking::{Chunker, FixedSizeChunker};
use mitra_rag::document::{Page, SourceDocument};
use proptest::prelude::*;

/// Drop each chunk's overlap prefix and concatenate what remains.
fn reassemble(texts: &[String], overlap: usize) -> String {
    let mut out = String::new();
    for (i, text) in texts.iter().enumerate() {
        if i == 0 {
            out.push_str(text);
        } else {
            out.extend(text.chars().skip(overlap));
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Chunking then re-concatenating (minus overlaps) reproduces every
    /// page's text exactly: the split loses no data.
    #[test]
    fn chunking_loses_no_page_text(
        pages in proptest::collection::vec(".{0,200}", 1..4),
        chunk_size in 5usize..64,
        overlap_fraction in 0usize..4,
    ) {
        // Overlap strictly smaller than the chunk size, as the config
        // builder enforces.
        let overlap = (chunk_size * overlap_fraction) / 8;

        let document = SourceDocument {
            id: "prop".to_string(),
            pages: pages
                .iter()
                .enumerate()
                .map(|(i, text)| Page { number: i + 1, text: text.clone() })
                .collect(),
        };

        let chunker = FixedSizeChunker::new(chunk_size, overlap);
        let chunks = chunker.chunk(&document);

        for page in &document.pages {
            let texts: Vec<String> = chunks
                .iter()
                .filter(|c| c.page == page.number)
                .map(|c| c.text.clone())
                .collect();
            prop_assert_eq!(reassemble(&texts, overlap), page.text.clone());
        }
    }

    /// No chunk ever exceeds the configured size, and every chunk's text
    /// appears verbatim in its source page.
    #[test]
    fn chunks_are_bounded_and_faithful(
        text in ".{1,300}",
        chunk_size in 5usize..64,
    ) {
        let document = SourceDocument {
            id: "prop".to_string(),
            pages: vec![Page { number: 1, text: text.clone() }],
        };

        let chunker = FixedSizeChunker::new(chunk_size, chunk_size / 4);
        let chunks = chunker.chunk(&document);

        for chunk in &chunks {
            prop_assert!(chunk.text.chars().count() <= chunk_size);
            prop_assert!(text.contains(&chunk.text));
        }
    }
}
