//! The retrieval-augmented answerer.
//!
//! [`KnowledgeService`] ties the pipeline together: it builds indexes from
//! registered knowledge sources, caches loaded index handles for the process
//! lifetime, and answers free-text questions by retrieving context and
//! forwarding it to a chat model.
//!
//! `answer` is the designated degrade-to-text boundary: typed errors flow
//! normally through every layer below it, and it converts all of them into a
//! plain user-facing sentence. Callers of `answer` never see an `Err`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::chat::ChatModel;
use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::KnowledgeConfig;
use crate::document::{Chunk, RetrievedChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{KbError, Result};
use crate::loader::load_and_chunk;
use crate::store::{IndexHandle, IndexStore};

/// One knowledge source: a document on disk and the namespace its index is
/// persisted under.
///
/// The reward guide and the sustainability knowledge base are two values of
/// this type, not two copies of the pipeline.
#[derive(Debug, Clone)]
pub struct KnowledgeSource {
    /// Namespace the index is persisted and queried under.
    pub namespace: String,
    /// Path of the source document.
    pub document_path: PathBuf,
}

impl KnowledgeSource {
    /// Create a new knowledge source.
    pub fn new(namespace: impl Into<String>, document_path: impl Into<PathBuf>) -> Self {
        Self { namespace: namespace.into(), document_path: document_path.into() }
    }
}

/// The retrieval-augmented answerer over a set of knowledge sources.
///
/// Construct one via [`KnowledgeService::builder()`].
pub struct KnowledgeService {
    config: KnowledgeConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Option<Arc<dyn ChatModel>>,
    chunker: Arc<dyn Chunker>,
    store: IndexStore,
    sources: HashMap<String, KnowledgeSource>,
    handles: RwLock<HashMap<String, Arc<IndexHandle>>>,
}

impl KnowledgeService {
    /// Create a new [`KnowledgeServiceBuilder`].
    pub fn builder() -> KnowledgeServiceBuilder {
        KnowledgeServiceBuilder::default()
    }

    /// Return a reference to the service configuration.
    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    /// Return the registered source for `namespace`, if any.
    pub fn source(&self, namespace: &str) -> Option<&KnowledgeSource> {
        self.sources.get(namespace)
    }

    /// Load and chunk a source document, without touching the store.
    pub fn load_and_chunk(&self, source: &KnowledgeSource) -> Result<Vec<Chunk>> {
        load_and_chunk(&source.document_path, self.chunker.as_ref())
    }

    /// Build the index for a registered namespace if no persisted index
    /// exists yet. Returns `true` if a build ran.
    ///
    /// This is the offline build step; it is a no-op when the snapshot is
    /// already present.
    pub async fn ensure_index(&self, namespace: &str) -> Result<bool> {
        if self.store.exists(namespace).await {
            info!(namespace, "index already exists");
            return Ok(false);
        }
        self.rebuild_index(namespace).await?;
        Ok(true)
    }

    /// Build the index for a registered namespace unconditionally, replacing
    /// any persisted snapshot. Returns the number of chunks indexed.
    ///
    /// A handle already cached in this process keeps serving the old
    /// content; the rebuild is visible to fresh loads only.
    pub async fn rebuild_index(&self, namespace: &str) -> Result<usize> {
        let source = self.sources.get(namespace).ok_or_else(|| KbError::Config(format!(
            "no knowledge source registered for namespace '{namespace}'"
        )))?;

        let chunks = self.load_and_chunk(source)?;
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let count = chunks.len();
        self.store
            .build(namespace, self.embedder.model_id(), self.embedder.dimensions(), chunks, vectors)
            .await?;
        Ok(count)
    }

    /// Answer a question from the named knowledge source.
    ///
    /// Always returns a string. Any internal failure (a missing or corrupt
    /// index, an embedding failure, a hosted model failure) is converted
    /// into a user-facing sentence that names the problem; nothing is
    /// raised past this boundary.
    pub async fn answer(&self, namespace: &str, question: &str) -> String {
        match self.try_answer(namespace, question).await {
            Ok(text) => text,
            Err(e @ KbError::IndexNotFound { .. }) => {
                warn!(namespace, error = %e, "knowledge base unavailable");
                format!(
                    "Sorry, I couldn't load the '{namespace}' knowledge base. \
                     Please try again later."
                )
            }
            Err(e) => {
                error!(namespace, error = %e, "failed to answer question");
                format!("Sorry, I encountered an error while answering your question: {e}")
            }
        }
    }

    /// The typed answer path: handle → embed → search → compose → complete.
    async fn try_answer(&self, namespace: &str, question: &str) -> Result<String> {
        let chat = self.chat.as_ref().ok_or_else(|| {
            KbError::Config("no chat model configured for answering".to_string())
        })?;

        let handle = self.handle(namespace).await?;
        let query = self.embedder.embed(question).await?;
        let retrieved = handle.search(&query, self.config.top_k)?;
        info!(namespace, result_count = retrieved.len(), "retrieved context");

        let prompt = compose_prompt(&retrieved, question);
        chat.complete(&prompt).await
    }

    /// Fetch the cached handle for `namespace`, loading it on first use.
    ///
    /// Two concurrent first calls may both load; the loads are idempotent
    /// reads of an immutable snapshot and the last insert wins over
    /// identical data. The lock is never held across a load or a search.
    async fn handle(&self, namespace: &str) -> Result<Arc<IndexHandle>> {
        if let Some(handle) = self.handles.read().await.get(namespace) {
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(
            self.store
                .load(namespace, self.embedder.model_id(), self.embedder.dimensions())
                .await?,
        );
        self.handles.write().await.insert(namespace.to_string(), Arc::clone(&handle));
        Ok(handle)
    }
}

/// Compose the answer-synthesis prompt from retrieved context and the
/// question.
fn compose_prompt(context: &[RetrievedChunk], question: &str) -> String {
    let mut prompt = String::from(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try \
         to make up an answer.\n\n",
    );
    for item in context {
        prompt.push_str(&item.chunk.text);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt.push_str("\nHelpful Answer:");
    prompt
}

/// Builder for constructing a [`KnowledgeService`].
///
/// `embedder` is required. The chat model is only required for
/// [`answer`](KnowledgeService::answer); a service built without one can
/// still build and inspect indexes (the CLI's offline build path does
/// exactly that).
#[derive(Default)]
pub struct KnowledgeServiceBuilder {
    config: Option<KnowledgeConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chat: Option<Arc<dyn ChatModel>>,
    chunker: Option<Arc<dyn Chunker>>,
    sources: Vec<KnowledgeSource>,
}

impl KnowledgeServiceBuilder {
    /// Set the configuration. Defaults to [`KnowledgeConfig::default()`].
    pub fn config(mut self, config: KnowledgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider (required).
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the chat model used for answer synthesis.
    pub fn chat_model(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Override the chunker. Defaults to a [`FixedSizeChunker`] with the
    /// configured size and overlap.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Register a knowledge source. May be called once per namespace.
    pub fn source(mut self, source: KnowledgeSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Build the [`KnowledgeService`].
    ///
    /// # Errors
    ///
    /// Returns [`KbError::Config`] if the embedder is missing or two sources
    /// share a namespace.
    pub fn build(self) -> Result<KnowledgeService> {
        let config = self.config.unwrap_or_default();
        let embedder = self
            .embedder
            .ok_or_else(|| KbError::Config("embedder is required".to_string()))?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)));

        let mut sources = HashMap::new();
        for source in self.sources {
            let namespace = source.namespace.clone();
            if sources.insert(namespace.clone(), source).is_some() {
                return Err(KbError::Config(format!(
                    "duplicate knowledge source for namespace '{namespace}'"
                )));
            }
        }

        let store = IndexStore::new(&config.index_dir);
        Ok(KnowledgeService {
            config,
            embedder,
            chat: self.chat,
            chunker,
            store,
            sources,
            handles: RwLock::new(HashMap::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;

    fn retrieved(text: &str, index: usize) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk {
                id: format!("doc_{index}"),
                text: text.to_string(),
                page: 1,
                document_id: "doc".to_string(),
                chunk_index: index,
            },
            score: 1.0,
        }
    }

    #[test]
    fn prompt_contains_context_then_question() {
        let context = vec![retrieved("Tokens are earned by recycling.", 0)];
        let prompt = compose_prompt(&context, "How do I earn tokens?");

        let context_pos = prompt.find("Tokens are earned by recycling.").unwrap();
        let question_pos = prompt.find("Question: How do I earn tokens?").unwrap();
        assert!(context_pos < question_pos);
        assert!(prompt.ends_with("Helpful Answer:"));
    }

    #[test]
    fn prompt_without_context_still_carries_the_question() {
        let prompt = compose_prompt(&[], "Anything?");
        assert!(prompt.contains("Question: Anything?"));
    }

    #[test]
    fn builder_requires_an_embedder() {
        let result = KnowledgeService::builder().build();
        assert!(matches!(result, Err(KbError::Config(_))));
    }

    #[test]
    fn builder_rejects_duplicate_namespaces() {
        let result = KnowledgeService::builder()
            .embedder(Arc::new(crate::mock::MockEmbedder::new()))
            .source(KnowledgeSource::new("reward_guide", "a.txt"))
            .source(KnowledgeSource::new("reward_guide", "b.txt"))
            .build();
        assert!(matches!(result, Err(KbError::Config(_))));
    }
}
