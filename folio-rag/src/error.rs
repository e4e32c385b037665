//! Error types for the `folio-rag` crate.

use thiserror::Error;

/// Errors that can occur while answering a chat request.
#[derive(Debug, Error)]
pub enum RagError {
    /// The caller sent a request that cannot be answered (client error).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion service failed, either before or during streaming.
    #[error("Completion error ({service}): {message}")]
    CompletionError {
        /// The completion service that produced the error.
        service: String,
        /// A description of the failure.
        message: String,
    },

    /// The conversation log sink rejected an entry.
    ///
    /// Never surfaced to the chat caller; background logging only warns.
    #[error("Conversation logger error: {0}")]
    LoggerError(String),

    /// The content source could not be read during indexing.
    #[error("Content source error ({source_name}): {message}")]
    ContentSourceError {
        /// The content source that produced the error.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the retrieval pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    /// Whether this error was caused by the caller rather than by an upstream
    /// collaborator. The HTTP layer maps this to a 4xx status.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RagError::InvalidRequest(_))
    }
}

/// A convenience result type for Folio operations.
pub type Result<T> = std::result::Result<T, RagError>;
