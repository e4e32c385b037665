//! Retrieval orchestrator.
//!
//! [`RagPipeline`] owns the injected [`EmbeddingProvider`], [`VectorStore`]
//! and [`Chunker`] and runs the two workflows around them:
//!
//! - indexing: content source → chunk → embed → upsert
//! - retrieval: expanded query → embed → thresholded search
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_rag::{InMemoryVectorStore, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::builder().top_k(20).min_score(0.3).build()?)
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.index(&cms_source).await?;
//! let hits = pipeline.retrieve("virgin america", 20, 0.3).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, ParagraphChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::source::ContentSource;
use crate::vectorstore::VectorStore;

/// The retrieval pipeline. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

/// Outcome of [`RagPipeline::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub chunks: usize,
}

impl RagPipeline {
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create the configured collection with the provider's dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the store rejects the collection.
    pub async fn create_collection(&self) -> Result<()> {
        let name = self.config.collection.as_str();
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(name, dimensions).await.map_err(|e| {
            error!(collection = name, error = %e, "collection creation failed");
            RagError::PipelineError(format!("could not create collection '{name}': {e}"))
        })
    }

    /// Chunk, embed and store one document in the configured collection.
    ///
    /// Returns the stored chunks with embeddings attached.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] naming the document if embedding
    /// or storage fails.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<Chunk>> {
        let collection = self.config.collection.as_str();
        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            info!(document.id = %document.id, "document has no text, skipped");
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "document embedding failed");
            RagError::PipelineError(format!("could not embed document '{}': {e}", document.id))
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::PipelineError(format!(
                "embedding provider returned {} vectors for {} chunks of document '{}'",
                embeddings.len(),
                chunks.len(),
                document.id
            )));
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.upsert(collection, &chunks).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "chunk upsert failed");
            RagError::PipelineError(format!(
                "could not store chunks of document '{}': {e}",
                document.id
            ))
        })?;

        info!(
            document.id = %document.id,
            source = %document.source,
            chunk_count = chunks.len(),
            "ingested document"
        );
        Ok(chunks)
    }

    /// Pull every document from `source` and ingest it, creating the
    /// collection first if needed. Stops at the first failing document.
    pub async fn index(&self, source: &dyn ContentSource) -> Result<IndexReport> {
        let documents = source.fetch_documents().await.map_err(|e| {
            error!(source = source.name(), error = %e, "failed to fetch content");
            e
        })?;
        self.create_collection().await?;

        let mut report = IndexReport::default();
        for document in &documents {
            report.chunks += self.ingest(document).await?.len();
            report.documents += 1;
        }
        info!(
            source = source.name(),
            documents = report.documents,
            chunks = report.chunks,
            "indexed content source"
        );
        Ok(report)
    }

    /// Embed `expanded_query` once and search the store with the given knobs.
    ///
    /// Results come back exactly as the store ordered and filtered them. An
    /// empty query is still embedded and searched.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or search fails; a
    /// failure never degrades into an empty result list.
    pub async fn retrieve(
        &self,
        expanded_query: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let collection = self.config.collection.as_str();

        let query_embedding = self.embedding_provider.embed(expanded_query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            RagError::PipelineError(format!("could not embed query: {e}"))
        })?;

        let results = self
            .vector_store
            .search(collection, &query_embedding, top_k, min_score)
            .await
            .map_err(|e| {
                error!(collection, error = %e, "vector store search failed");
                RagError::PipelineError(format!("could not search collection '{collection}': {e}"))
            })?;

        info!(result_count = results.len(), top_k, min_score, "retrieval completed");
        Ok(results)
    }

    /// [`retrieve`](Self::retrieve) with the configured `top_k` and `min_score`.
    pub async fn retrieve_default(&self, expanded_query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve(expanded_query, self.config.top_k, self.config.min_score).await
    }
}

/// Assembles a [`RagPipeline`] from its collaborators.
///
/// `embedding_provider` and `vector_store` are required. Without an explicit
/// chunker a [`ParagraphChunker`] sized from the config is used.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required collaborator is missing
    /// or the config fails [`RagConfig::validate`].
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(ParagraphChunker::new(config.chunk_size, config.chunk_overlap))
        });

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker })
    }
}
