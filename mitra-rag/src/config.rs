//! Configuration for a knowledge pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KbError, Result};

/// Configuration parameters shared by every knowledge source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeConfig {
    /// Directory persisted index snapshots live under.
    pub index_dir: PathBuf,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Identifier of the hosted model used for answer synthesis.
    pub chat_model: String,
    /// Sampling temperature for answer synthesis.
    pub temperature: f32,
    /// Bound on a single hosted model call.
    pub request_timeout: Duration,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("vectorstore"),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 3,
            chat_model: crate::openai::DEFAULT_CHAT_MODEL.to_string(),
            temperature: crate::openai::DEFAULT_TEMPERATURE,
            request_timeout: crate::openai::DEFAULT_TIMEOUT,
        }
    }
}

impl KnowledgeConfig {
    /// Create a new builder for constructing a [`KnowledgeConfig`].
    pub fn builder() -> KnowledgeConfigBuilder {
        KnowledgeConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`KnowledgeConfig`].
#[derive(Debug, Clone, Default)]
pub struct KnowledgeConfigBuilder {
    config: KnowledgeConfig,
}

impl KnowledgeConfigBuilder {
    /// Set the directory index snapshots are persisted under.
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.index_dir = dir.into();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the hosted model used for answer synthesis.
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.config.chat_model = model.into();
        self
    }

    /// Set the sampling temperature for answer synthesis.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the bound on a single hosted model call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the [`KnowledgeConfig`], validating that parameters are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<KnowledgeConfig> {
        if self.config.chunk_size == 0 {
            return Err(KbError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(KbError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(KbError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_knowledge_sources() {
        let config = KnowledgeConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.chat_model, "gpt-4o-mini");
    }

    #[test]
    fn builder_rejects_overlap_not_smaller_than_size() {
        let result = KnowledgeConfig::builder().chunk_size(100).chunk_overlap(100).build();
        assert!(matches!(result, Err(KbError::Config(_))));
    }

    #[test]
    fn builder_rejects_zero_top_k() {
        let result = KnowledgeConfig::builder().top_k(0).build();
        assert!(matches!(result, Err(KbError::Config(_))));
    }

    #[test]
    fn builder_rejects_zero_chunk_size() {
        let result = KnowledgeConfig::builder().chunk_size(0).chunk_overlap(0).build();
        assert!(matches!(result, Err(KbError::Config(_))));
    }
}
