//! # folio-rag
//!
//! Retrieval-augmented query pipeline behind the Folio portfolio chatbot.
//!
//! ## Overview
//!
//! A visitor's question flows through four stages:
//!
//! - [`query`] - rule-based preprocessing (normalization, entity and topic
//!   detection, first-person rewriting, query expansion)
//! - [`RagPipeline`] - embed the expanded query and run a thresholded
//!   similarity search against the [`VectorStore`]
//! - [`context`] - render the ranked passages into one grounding string
//! - [`CompletionDispatcher`] - send the final prompt to a
//!   [`CompletionService`], stream tokens back, log the finished answer
//!
//! [`ChatService`] drives a whole request; `folio-server` exposes it over HTTP.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio_rag::{
//!     ChatRequest, ChatService, CompletionDispatcher, DispatchConfig, InMemoryVectorStore,
//!     RagPipeline, TracingConversationLogger,
//! };
//!
//! let pipeline = Arc::new(
//!     RagPipeline::builder()
//!         .embedding_provider(Arc::new(embedder))
//!         .vector_store(Arc::new(InMemoryVectorStore::new()))
//!         .build()?,
//! );
//! let logger = Arc::new(TracingConversationLogger);
//! let dispatcher =
//!     CompletionDispatcher::new(completions, logger.clone(), DispatchConfig::default());
//! let chat = ChatService::new(pipeline, dispatcher, logger);
//!
//! let response = chat.respond(request).await?;
//! while let Some(token) = response.stream.next().await { /* ... */ }
//! ```
//!
//! ## Features
//!
//! | Feature | Adds |
//! |---------|------|
//! | `openai` | [`openai::OpenAIEmbeddingProvider`], [`openai::OpenAICompletionService`] |
//! | `pgvector` | [`pgvector::PgVectorStore`] |
//! | `full` | all of the above |

pub mod chat;
pub mod chunking;
pub mod completion;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod lexicon;
pub mod logger;
pub mod message;
pub mod pipeline;
pub mod query;
pub mod source;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;

pub use chat::{ChatRequest, ChatResponse, ChatService, RequestStage};
pub use chunking::{Chunker, ParagraphChunker};
pub use completion::{CompletionRequest, CompletionService, TokenStream};
pub use config::{RagConfig, RagConfigBuilder};
pub use context::AssembledContext;
pub use dispatch::{CompletionDispatcher, DispatchConfig};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use logger::{
    ConversationLogger, InMemoryConversationLogger, LogEntry, LoggedMessage,
    TracingConversationLogger,
};
pub use message::{ChatMessage, Role, SessionId};
pub use pipeline::{IndexReport, RagPipeline, RagPipelineBuilder};
pub use query::PreprocessedQuery;
pub use source::{ContentSource, StaticContentSource};
pub use vectorstore::VectorStore;
