//! pgvector (PostgreSQL) vector store backend.
//!
//! Only available with the `pgvector` feature. Each collection is a table
//! `folio_{name}` with columns `id`, `text`, `source`, `embedding vector(n)`,
//! `metadata jsonb` and `document_id`. Scores are cosine similarity
//! (`1 - (embedding <=> query)`); threshold and limit are applied in SQL.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "pgvector";

/// A [`VectorStore`] backed by PostgreSQL with the pgvector extension.
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    /// Connect to the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(Self::map_err)?;
        Ok(Self { pool })
    }

    /// Use an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
    }

    /// Table name for a collection; only alphanumerics and underscores survive.
    fn table_name(collection: &str) -> Result<String> {
        let sanitized: String = collection
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if sanitized.is_empty() {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: "collection name must not be empty".to_string(),
            });
        }
        Ok(format!("folio_{sanitized}"))
    }
}

/// pgvector literal, e.g. `[0.1,0.2]`.
fn vector_literal(embedding: &[f32]) -> String {
    format!("[{}]", embedding.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
}

fn row_to_result(row: &PgRow) -> std::result::Result<SearchResult, sqlx::Error> {
    let metadata_value: serde_json::Value = row.try_get("metadata")?;
    let metadata: HashMap<String, String> = metadata_value
        .as_object()
        .map(|obj| {
            obj.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect()
        })
        .unwrap_or_default();
    let score: f64 = row.try_get("score")?;

    Ok(SearchResult {
        chunk: Chunk {
            id: row.try_get("id")?,
            text: row.try_get("text")?,
            source: row.try_get("source")?,
            embedding: Vec::new(),
            metadata,
            document_id: row.try_get("document_id")?,
        },
        score: score as f32,
    })
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let table = Self::table_name(name)?;

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                id TEXT PRIMARY KEY, \
                text TEXT NOT NULL, \
                source TEXT NOT NULL, \
                embedding vector({dimensions}) NOT NULL, \
                metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
                document_id TEXT NOT NULL\
            )"
        );
        sqlx::query(&create_sql).execute(&self.pool).await.map_err(Self::map_err)?;

        debug!(collection = name, %table, dimensions, "created pgvector table");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let table = Self::table_name(name)?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;
        debug!(collection = name, %table, "dropped pgvector table");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let table = Self::table_name(collection)?;
        let upsert_sql = format!(
            "INSERT INTO {table} (id, text, source, embedding, metadata, document_id) \
             VALUES ($1, $2, $3, $4::vector, $5::jsonb, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                text = EXCLUDED.text, \
                source = EXCLUDED.source, \
                embedding = EXCLUDED.embedding, \
                metadata = EXCLUDED.metadata, \
                document_id = EXCLUDED.document_id"
        );

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        for chunk in chunks {
            let metadata = serde_json::to_string(&chunk.metadata).map_err(|e| {
                RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
            })?;
            sqlx::query(&upsert_sql)
                .bind(&chunk.id)
                .bind(&chunk.text)
                .bind(&chunk.source)
                .bind(vector_literal(&chunk.embedding))
                .bind(metadata)
                .bind(&chunk.document_id)
                .execute(&mut *tx)
                .await
                .map_err(Self::map_err)?;
        }
        tx.commit().await.map_err(Self::map_err)?;

        debug!(collection, count = chunks.len(), "upserted chunks to pgvector");
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let table = Self::table_name(collection)?;
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        sqlx::query(&format!("DELETE FROM {table} WHERE id = ANY($1)"))
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let table = Self::table_name(collection)?;
        let search_sql = format!(
            "SELECT id, text, source, metadata, document_id, \
                    1 - (embedding <=> $1::vector) AS score \
             FROM {table} \
             WHERE 1 - (embedding <=> $1::vector) >= $2 \
             ORDER BY embedding <=> $1::vector \
             LIMIT $3"
        );

        let rows = sqlx::query(&search_sql)
            .bind(vector_literal(embedding))
            .bind(f64::from(min_score))
            .bind(i64::try_from(top_k).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(Self::map_err)?;

        rows.iter()
            .map(row_to_result)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Self::map_err)
    }
}
