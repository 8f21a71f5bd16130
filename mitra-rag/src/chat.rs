//! Chat completion trait for answer synthesis.

use async_trait::async_trait;

use crate::error::Result;

/// A hosted (or mock) language model that completes a prompt with text.
///
/// The answerer composes a prompt from retrieved context plus the user's
/// question and returns the completion verbatim. The call is the dominant
/// latency source of the whole pipeline and is awaited without holding any
/// lock.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete `prompt`, returning the model's text response.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::ExternalService`](crate::KbError::ExternalService)
    /// if the call fails or times out.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Return the identifier of the underlying model.
    fn model_id(&self) -> &str;
}
