//! OpenAI-backed providers: hosted embeddings and chat completion.
//!
//! Both clients speak the plain REST endpoints through `reqwest`; no SDK.
//! The chat client is what the answerer uses in production. The embedding
//! client is a hosted alternative to the default local model for deployments
//! that prefer not to run inference in-process.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::chat::ChatModel;
use crate::embedding::EmbeddingProvider;
use crate::error::{KbError, Result};

/// The OpenAI embeddings endpoint.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The OpenAI chat completions endpoint.
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for hosted embeddings.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default dimensionality for `text-embedding-3-small`.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Default model for answer synthesis.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature for answer synthesis. Low on purpose:
/// answers should stay close to the retrieved context.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default bound on a single hosted call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| KbError::Config(format!("failed to build HTTP client: {e}")))
}

fn api_key_from_env() -> Result<String> {
    std::env::var("OPENAI_API_KEY")
        .map_err(|_| KbError::Config("OPENAI_API_KEY environment variable not set".to_string()))
}

// ── Hosted embedding provider ──────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Create a new provider with the given API key.
    ///
    /// Uses the default model (`text-embedding-3-small`, 1536 dimensions)
    /// and the default request timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(KbError::Config("API key must not be empty".to_string()));
        }

        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            api_key,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        })
    }

    /// Create a provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env()?)
    }

    /// Set the model name and its output dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Extract a readable error message from a non-success response body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| KbError::ExternalService {
            service: "openai-embeddings".to_string(),
            message: "API returned empty response".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), model = %self.model, "embedding batch via API");

        let request_body = EmbeddingRequest { model: &self.model, input: texts.to_vec() };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding request failed");
                KbError::ExternalService {
                    service: "openai-embeddings".to_string(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(%status, "embedding API error");
            return Err(KbError::ExternalService {
                service: "openai-embeddings".to_string(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            KbError::ExternalService {
                service: "openai-embeddings".to_string(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ── Chat completion client ─────────────────────────────────────────

/// A [`ChatModel`] backed by the OpenAI chat completions API.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    /// Create a new chat client with the given API key and the defaults
    /// (`gpt-4o-mini`, temperature 0.2, 30 second timeout).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Create a new chat client with an explicit request timeout.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(KbError::Config("API key must not be empty".to_string()));
        }

        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Create a chat client using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env()?)
    }

    /// Set the model name (e.g. `gpt-4o`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "completion request failed");
                KbError::ExternalService {
                    service: "openai-chat".to_string(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(%status, "chat API error");
            return Err(KbError::ExternalService {
                service: "openai-chat".to_string(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            KbError::ExternalService {
                service: "openai-chat".to_string(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| KbError::ExternalService {
                service: "openai-chat".to_string(),
                message: "API returned no completion".to_string(),
            })
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(OpenAiEmbedder::new(""), Err(KbError::Config(_))));
        assert!(matches!(OpenAiChatModel::new(""), Err(KbError::Config(_))));
    }

    #[test]
    fn error_detail_prefers_structured_message() {
        let body = r#"{"error": {"message": "invalid key"}}"#.to_string();
        assert_eq!(error_detail(body), "invalid key");
        assert_eq!(error_detail("plain failure".to_string()), "plain failure");
    }
}
