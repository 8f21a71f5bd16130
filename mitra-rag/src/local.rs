//! Locally-run sentence embedding provider.
//!
//! This module is only available when the `local` feature is enabled (it is
//! part of the default feature set). It wraps `fastembed`'s ONNX runtime
//! around the same all-MiniLM-L6-v2 model family the hosted knowledge base
//! was originally indexed with.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{KbError, Result};

/// Identifier of the default local model, as published on the model hub.
pub const LOCAL_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimensionality of all-MiniLM-L6-v2.
const LOCAL_DIMENSIONS: usize = 384;

/// An [`EmbeddingProvider`] backed by a locally-run sentence embedding model.
///
/// The model is loaded once (downloading weights on first use if they are not
/// cached) and reused for every call. Inference is synchronous CPU work, so
/// calls are dispatched to a blocking thread.
///
/// A load failure is [`KbError::EmbeddingModelUnavailable`] — fatal for any
/// pipeline instance that needs this provider, not a per-call condition.
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalEmbedder {
    /// Load the default model (`all-MiniLM-L6-v2`, 384 dimensions) using the
    /// default weight cache location.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::EmbeddingModelUnavailable`] if the weights cannot
    /// be fetched or the runtime cannot be initialized.
    pub fn load() -> Result<Self> {
        Self::load_with_cache_dir(None)
    }

    /// Load the default model, caching weights under `cache_dir`.
    pub fn load_with_cache_dir(cache_dir: Option<PathBuf>) -> Result<Self> {
        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options)
            .map_err(|e| KbError::EmbeddingModelUnavailable { message: e.to_string() })?;

        Ok(Self { model: Arc::new(Mutex::new(model)) })
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| KbError::EmbeddingModelUnavailable {
            message: "model returned no embedding".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), model = LOCAL_MODEL_ID, "embedding batch locally");

        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let model = Arc::clone(&self.model);

        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = model
                .lock()
                .map_err(|_| "embedding model lock poisoned".to_string())?;
            guard.embed(owned, None).map_err(|e| e.to_string())
        })
        .await;

        match joined {
            Ok(Ok(vectors)) => Ok(vectors),
            Ok(Err(message)) => Err(KbError::EmbeddingModelUnavailable { message }),
            Err(e) => Err(KbError::EmbeddingModelUnavailable {
                message: format!("embedding task failed: {e}"),
            }),
        }
    }

    fn dimensions(&self) -> usize {
        LOCAL_DIMENSIONS
    }

    fn model_id(&self) -> &str {
        LOCAL_MODEL_ID
    }
}
