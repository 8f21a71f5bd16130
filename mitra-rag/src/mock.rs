//! Deterministic mock implementations for tests and offline development.
//!
//! [`MockEmbedder`] produces lexical bag-of-ngram vectors: texts that share
//! character n-grams get similar vectors, so retrieval ordering follows
//! lexical overlap. [`MockChatModel`] echoes its prompt, returns a canned
//! reply, or fails on demand.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::chat::ChatModel;
use crate::embedding::EmbeddingProvider;
use crate::error::{KbError, Result};

/// Dimensionality of mock embeddings, matching the default local model.
const MOCK_DIMENSIONS: usize = 384;

/// A deterministic, dependency-free [`EmbeddingProvider`].
///
/// Each text is reduced to a bag of character n-grams (3- and 4-grams of
/// each word; short words count whole). Every distinct n-gram is assigned a
/// vector slot in first-seen order, so within one embedder instance two
/// texts sharing n-grams have provably overlapping vectors and cosine
/// similarity tracks lexical overlap exactly.
///
/// Slots are per instance: vectors from different `MockEmbedder` instances
/// are not comparable. Use one instance for both indexing and querying.
pub struct MockEmbedder {
    slots: Mutex<HashMap<String, usize>>,
}

impl MockEmbedder {
    /// Create a new mock embedder with an empty vocabulary.
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; MOCK_DIMENSIONS];
        let normalized: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();

        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            // A poisoned registry still holds valid slot assignments.
            Err(poisoned) => poisoned.into_inner(),
        };

        for word in normalized.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() < 3 {
                bump(&mut vector, &mut slots, word);
                continue;
            }
            for gram in chars.windows(3) {
                bump(&mut vector, &mut slots, &gram.iter().collect::<String>());
            }
            for gram in chars.windows(4) {
                bump(&mut vector, &mut slots, &gram.iter().collect::<String>());
            }
        }

        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

fn bump(vector: &mut [f32], slots: &mut HashMap<String, usize>, token: &str) {
    let next = slots.len();
    let slot = *slots.entry(token.to_string()).or_insert(next);
    vector[slot % MOCK_DIMENSIONS] += 1.0;
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimensions(&self) -> usize {
        MOCK_DIMENSIONS
    }

    fn model_id(&self) -> &str {
        "mock-embedder"
    }
}

/// A [`ChatModel`] for tests: echoes the prompt by default, or returns a
/// fixed reply, or fails with an external-service error.
pub struct MockChatModel {
    reply: Option<String>,
    failure: Option<String>,
}

impl MockChatModel {
    /// A model that completes every prompt by echoing it back.
    pub fn echo() -> Self {
        Self { reply: None, failure: None }
    }

    /// A model that answers every prompt with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self { reply: Some(reply.into()), failure: None }
    }

    /// A model whose every call fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { reply: None, failure: Some(message.into()) }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Some(message) = &self.failure {
            return Err(KbError::ExternalService {
                service: "mock-chat".to_string(),
                message: message.clone(),
            });
        }
        Ok(self.reply.clone().unwrap_or_else(|| prompt.to_string()))
    }

    fn model_id(&self) -> &str {
        "mock-chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_texts_embed_identically() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed("recycling plastic earns tokens").await.unwrap();
        let b = embedder.embed("recycling plastic earns tokens").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), embedder.dimensions());
    }

    #[tokio::test]
    async fn lexical_overlap_beats_disjoint_text() {
        let embedder = MockEmbedder::new();
        let base = embedder.embed("tokens are earned by recycling").await.unwrap();
        let close = embedder.embed("how to earn tokens").await.unwrap();
        let far = embedder.embed("completely unrelated words here").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        assert!(dot(&base, &close) > dot(&base, &far));
    }

    #[tokio::test]
    async fn failing_chat_model_reports_external_service_error() {
        let chat = MockChatModel::failing("boom");
        let err = chat.complete("anything").await.unwrap_err();
        assert!(matches!(err, KbError::ExternalService { .. }));
    }

    #[tokio::test]
    async fn echo_chat_model_returns_the_prompt() {
        let chat = MockChatModel::echo();
        let reply = chat.complete("the prompt").await.unwrap();
        assert_eq!(reply, "the prompt");
    }
}
