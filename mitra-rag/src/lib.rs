//! Document retrieval and retrieval-augmented answering for the PariMitra
//! marketplace assistant.
//!
//! The assistant answers questions about two knowledge sources — the token
//! reward guide and the Parivartana sustainability knowledge base — by
//! retrieving relevant document chunks from a persisted vector index and
//! handing them to a hosted chat model. This crate is that retrieval core:
//!
//! - [`DocumentLoader`] — reads a paginated source document (PDF or text)
//! - [`FixedSizeChunker`] — splits page text into overlapping chunks
//! - [`EmbeddingProvider`] — maps text to fixed-length vectors
//!   ([`LocalEmbedder`] runs a 384-dimension sentence embedding model
//!   in-process; [`OpenAiEmbedder`] is the hosted alternative)
//! - [`IndexStore`] — persists one index per namespace and restores it as an
//!   immutable, searchable [`IndexHandle`]
//! - [`KnowledgeService`] — the answerer: builds indexes offline, caches
//!   handles, and turns questions into answers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mitra_rag::{KnowledgeService, KnowledgeSource, LocalEmbedder, OpenAiChatModel};
//!
//! let service = KnowledgeService::builder()
//!     .embedder(Arc::new(LocalEmbedder::load()?))
//!     .chat_model(Arc::new(OpenAiChatModel::from_env()?))
//!     .source(KnowledgeSource::new("reward_guide", "data/reward_guide.pdf"))
//!     .build()?;
//!
//! service.ensure_index("reward_guide").await?;
//! let answer = service.answer("reward_guide", "How do I earn tokens?").await;
//! ```
//!
//! `answer` always returns a string: the service is the boundary that
//! converts internal typed errors into user-facing text, because its caller
//! is a best-effort conversational surface with no channel for structured
//! errors.

pub mod chat;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod loader;
#[cfg(feature = "local")]
pub mod local;
pub mod mock;
pub mod openai;
pub mod service;
pub mod store;

pub use chat::ChatModel;
pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{KnowledgeConfig, KnowledgeConfigBuilder};
pub use document::{Chunk, Page, RetrievedChunk, SourceDocument};
pub use embedding::EmbeddingProvider;
pub use error::{KbError, Result};
pub use loader::{DocumentLoader, load_and_chunk};
#[cfg(feature = "local")]
pub use local::LocalEmbedder;
pub use mock::{MockChatModel, MockEmbedder};
pub use openai::{OpenAiChatModel, OpenAiEmbedder};
pub use service::{KnowledgeService, KnowledgeServiceBuilder, KnowledgeSource};
pub use store::{IndexHandle, IndexStore};
