//! Indexed content: source documents, embedded chunks and scored hits.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A piece of portfolio content pulled from the CMS (a page, a case study,
/// a talk transcript).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable CMS id, e.g. `"case-study-virgin-america"`.
    pub id: String,
    /// Human readable source label, e.g. `"Case Study: Virgin America"`.
    pub source: String,
    /// Plain body text.
    pub text: String,
    /// Free-form CMS fields such as `title` or `published_at`.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document without metadata.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), source: source.into(), text: text.into(), metadata: HashMap::new() }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One embedded slice of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// `{document_id}_{index}`.
    pub id: String,
    pub text: String,
    /// Source label inherited from the parent document.
    pub source: String,
    /// Empty when read back from a store that does not return vectors.
    pub embedding: Vec<f32>,
    /// Document metadata plus `chunk_index`.
    pub metadata: HashMap<String, String>,
    pub document_id: String,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Cosine similarity with the query vector, in `[-1, 1]`.
    pub score: f32,
}
