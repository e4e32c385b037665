//! Embedding provider seam.

use async_trait::async_trait;

use crate::error::Result;

/// Converts text into a fixed-length dense vector.
///
/// The same provider must be used at index time and at query time; the
/// store assumes every vector in a collection has [`dimensions`](Self::dimensions)
/// components.
///
/// # Example
///
/// ```rust,ignore
/// use folio_rag::EmbeddingProvider;
///
/// let vector = provider.embed("tell me about virgin america").await?;
/// assert_eq!(vector.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text. An empty string is a valid input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving input order.
    ///
    /// Falls back to one [`embed`](Self::embed) call per text; providers with a
    /// native batch endpoint should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;
}
