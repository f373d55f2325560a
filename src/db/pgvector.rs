//! PostgreSQL pgvector integration.
//!
//! Each collection is a dedicated table with an `embedding vector(N)`
//! column. Similarity search uses the cosine distance operator `<=>`;
//! scores are reported as `1 - distance` so higher is better, matching
//! the in-memory store.
//!
//! Embeddings cross the wire as pgvector text literals (`[0.1,0.2,...]`)
//! cast with `::vector`, which keeps sqlx free of custom type bindings.

use crate::db::vectorstore::VectorStore;
use crate::types::{AppError, Document, DocumentMetadata, Result, SearchResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgPool;

pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Collection names become table names, so restrict them to a safe
    /// identifier alphabet instead of interpolating arbitrary input.
    fn table_name(collection: &str) -> Result<String> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(AppError::InvalidInput(format!(
                "Invalid collection name '{}': use lowercase letters, digits and underscores",
                collection
            )));
        }
        Ok(format!("vec_{}", collection))
    }

    /// Render an embedding as a pgvector text literal.
    fn vector_literal(embedding: &[f32]) -> String {
        let parts: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
        format!("[{}]", parts.join(","))
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn provider_name(&self) -> &'static str {
        "pgvector"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let table = Self::table_name(name)?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                title TEXT NOT NULL,
                source TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                embedding vector({dimensions}) NOT NULL
            )"
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create collection '{}': {}", name, e)))?;

        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let table = Self::table_name(name)?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to delete collection '{}': {}", name, e))
            })?;

        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let table = Self::table_name(name)?;

        let row = sqlx::query("SELECT to_regclass($1) IS NOT NULL AS present")
            .bind(&table)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to check collection: {}", e)))?;

        row.try_get("present")
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert(&self, collection: &str, documents: &[Document]) -> Result<usize> {
        let table = Self::table_name(collection)?;
        let query = format!(
            "INSERT INTO {table} (id, content, title, source, created_at, embedding)
             VALUES ($1, $2, $3, $4, $5, $6::vector)
             ON CONFLICT (id) DO UPDATE SET
                 content = EXCLUDED.content,
                 title = EXCLUDED.title,
                 source = EXCLUDED.source,
                 created_at = EXCLUDED.created_at,
                 embedding = EXCLUDED.embedding"
        );

        for document in documents {
            let embedding = document.embedding.as_ref().ok_or_else(|| {
                AppError::InvalidInput(format!("Document '{}' missing embedding", document.id))
            })?;

            sqlx::query(&query)
                .bind(&document.id)
                .bind(&document.content)
                .bind(&document.metadata.title)
                .bind(&document.metadata.source)
                .bind(document.metadata.created_at)
                .bind(Self::vector_literal(embedding))
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to upsert '{}': {}", document.id, e))
                })?;
        }

        Ok(documents.len())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        let table = Self::table_name(collection)?;
        let query = format!(
            "SELECT id, content, title, source, created_at,
                    1 - (embedding <=> $1::vector) AS score
             FROM {table}
             WHERE 1 - (embedding <=> $1::vector) >= $2
             ORDER BY embedding <=> $1::vector
             LIMIT $3"
        );

        let rows = sqlx::query(&query)
            .bind(Self::vector_literal(embedding))
            .bind(threshold as f64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Vector search failed: {}", e)))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| AppError::Database(e.to_string()))?;
            let content: String = row
                .try_get("content")
                .map_err(|e| AppError::Database(e.to_string()))?;
            let title: String = row
                .try_get("title")
                .map_err(|e| AppError::Database(e.to_string()))?;
            let source: String = row
                .try_get("source")
                .map_err(|e| AppError::Database(e.to_string()))?;
            let created_at: DateTime<Utc> = row
                .try_get("created_at")
                .map_err(|e| AppError::Database(e.to_string()))?;
            let score: f64 = row
                .try_get("score")
                .map_err(|e| AppError::Database(e.to_string()))?;

            results.push(SearchResult {
                document: Document {
                    id,
                    content,
                    metadata: DocumentMetadata {
                        title,
                        source,
                        created_at,
                    },
                    embedding: None,
                },
                score: score as f32,
            });
        }

        Ok(results)
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize> {
        let table = Self::table_name(collection)?;

        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ANY($1)"))
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete documents: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let table = Self::table_name(collection)?;

        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count documents: {}", e)))?;

        let count: i64 = row
            .try_get("n")
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_accepts_safe_identifiers() {
        assert_eq!(
            PgVectorStore::table_name("assist_knowledge").unwrap(),
            "vec_assist_knowledge"
        );
    }

    #[test]
    fn test_table_name_rejects_injection() {
        assert!(PgVectorStore::table_name("docs; DROP TABLE users").is_err());
        assert!(PgVectorStore::table_name("Docs").is_err());
        assert!(PgVectorStore::table_name("").is_err());
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(
            PgVectorStore::vector_literal(&[0.5, -1.0, 2.0]),
            "[0.5,-1,2]"
        );
    }
}
