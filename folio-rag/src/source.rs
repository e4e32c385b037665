//! Content sources feeding the indexing step.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

/// Read-only access to the site's published content (CMS pages, case
/// studies, transcripts).
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Every document that should be searchable.
    async fn fetch_documents(&self) -> Result<Vec<Document>>;
}

/// Serves a fixed set of documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticContentSource {
    documents: Vec<Document>,
}

impl StaticContentSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load documents from a JSON array of [`Document`] objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let documents = serde_json::from_str(json).map_err(|e| {
            crate::error::RagError::ContentSourceError {
                source_name: "static".to_string(),
                message: format!("invalid document JSON: {e}"),
            }
        })?;
        Ok(Self { documents })
    }
}

#[async_trait]
impl ContentSource for StaticContentSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}
