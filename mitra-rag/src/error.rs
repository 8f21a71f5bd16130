//! Error types for the `mitra-rag` crate.

use thiserror::Error;

/// Errors that can occur while building, loading, or querying a knowledge
/// index.
///
/// Errors propagate normally through the loader, chunker, embedder, and
/// store layers. [`KnowledgeService::answer`](crate::KnowledgeService::answer)
/// is the single boundary that converts them into user-facing text.
#[derive(Debug, Error)]
pub enum KbError {
    /// The source document path does not exist.
    #[error("Document not found: {path}")]
    DocumentNotFound {
        /// The path that was requested.
        path: String,
    },

    /// The source document exists but could not be read or parsed.
    #[error("Document could not be read ({path}): {message}")]
    DocumentUnreadable {
        /// The path that was requested.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding model could not be loaded. Fatal for any pipeline
    /// instance that needs it, not a per-call condition.
    #[error("Embedding model unavailable: {message}")]
    EmbeddingModelUnavailable {
        /// A description of the failure.
        message: String,
    },

    /// No persisted index exists for the namespace.
    #[error("No index found for namespace '{namespace}'")]
    IndexNotFound {
        /// The namespace that was requested.
        namespace: String,
    },

    /// The persisted index could not be deserialized, or disagrees with the
    /// current embedder's model or dimensionality.
    #[error("Index for namespace '{namespace}' is corrupt: {message}")]
    IndexCorrupt {
        /// The namespace that was requested.
        namespace: String,
        /// A description of the failure.
        message: String,
    },

    /// A search was called with invalid input (zero `k`, wrong query
    /// dimensionality).
    #[error("Invalid search input: {0}")]
    SearchInput(String),

    /// A hosted service call failed or timed out.
    #[error("External service error ({service}): {message}")]
    ExternalService {
        /// The service that produced the error.
        service: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for knowledge-base operations.
pub type Result<T> = std::result::Result<T, KbError>;
