//! Configuration for the retrieval pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default number of chunks requested from the store per query.
///
/// Deliberately high: the completion model ignores irrelevant passages, but a
/// passage that was never retrieved cannot be recovered.
pub const DEFAULT_TOP_K: usize = 20;

/// Default minimum similarity a chunk must reach to be returned.
pub const DEFAULT_MIN_SCORE: f32 = 0.3;

/// Configuration parameters for the retrieval pipeline.
///
/// Missing fields deserialize to their defaults, but deserialization does not
/// check ranges. Call [`RagConfig::validate`] on a deserialized value, or hand
/// it to [`RagPipelineBuilder::config`](crate::RagPipelineBuilder::config),
/// which validates on `build()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Vector store collection holding the indexed portfolio content.
    pub collection: String,
    /// Number of top results to request from vector search.
    pub top_k: usize,
    /// Minimum similarity score for results (results below this never appear).
    pub min_score: f32,
    /// Upper bound, in characters, on the chunk text handed to the context assembler.
    pub max_context_chars: usize,
    /// Maximum chunk size in characters when indexing content.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            collection: "portfolio".to_string(),
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            max_context_chars: 24_000,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `collection` is empty
    /// - `top_k == 0`
    /// - `min_score` is outside `[-1.0, 1.0]`
    /// - `max_context_chars == 0`
    /// - `chunk_overlap >= chunk_size`
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection must not be empty".to_string()));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.min_score) {
            return Err(RagError::ConfigError(format!(
                "min_score ({}) must be within [-1.0, 1.0]",
                self.min_score
            )));
        }
        if self.max_context_chars == 0 {
            return Err(RagError::ConfigError(
                "max_context_chars must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the collection name searched at query time.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the number of top results to request from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for returned results.
    pub fn min_score(mut self, threshold: f32) -> Self {
        self.config.min_score = threshold;
        self
    }

    /// Set the context size budget in characters.
    pub fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = chars;
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] under the conditions listed on
    /// [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_favor_recall() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config.top_k, DEFAULT_TOP_K);
        assert!(config.top_k >= 10);
        assert!(config.min_score < 0.5);
    }

    #[test]
    fn rejects_zero_top_k() {
        let err = RagConfig::builder().top_k(0).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(RagConfig::builder().min_score(1.5).build().is_err());
        assert!(RagConfig::builder().min_score(f32::NAN).build().is_err());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk() {
        assert!(RagConfig::builder().chunk_size(100).chunk_overlap(100).build().is_err());
    }

    #[test]
    fn deserializes_partial_config_with_defaults() {
        let config: RagConfig = serde_json::from_str(r#"{"top_k": 8}"#).unwrap();
        assert_eq!(config.top_k, 8);
        assert_eq!(config.collection, "portfolio");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserialized_values_are_checked_by_validate() {
        let zero_k: RagConfig = serde_json::from_str(r#"{"top_k": 0}"#).unwrap();
        assert!(matches!(zero_k.validate(), Err(RagError::ConfigError(_))));

        let wide: RagConfig = serde_json::from_str(r#"{"min_score": 2.0}"#).unwrap();
        let err = wide.validate().unwrap_err();
        assert!(err.to_string().contains("min_score"));
    }
}
