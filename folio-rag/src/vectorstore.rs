//! Document store seam: chunk storage plus thresholded similarity search.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for embedded chunks with similarity search.
///
/// Implementations must uphold the search contract for every call:
///
/// - results are ordered by descending score,
/// - at most `top_k` results are returned,
/// - no result scores below `min_score`.
///
/// # Example
///
/// ```rust,ignore
/// use folio_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("portfolio", 384).await?;
/// store.upsert("portfolio", &chunks).await?;
/// let hits = store.search("portfolio", &query_vector, 20, 0.3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection whose vectors all have `dimensions` components.
    /// No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert or replace chunks. Chunks must carry embeddings.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by their IDs from a collection.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;

    /// Return up to `top_k` chunks scoring at least `min_score`, best first.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;
}
