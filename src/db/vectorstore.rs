//! Vector store abstraction.
//!
//! A single trait covers the pgvector-backed production store and the
//! in-memory store used by tests. Collections are created with a fixed
//! dimensionality and hold documents with their embeddings.

use crate::types::{AppError, Document, Result, SearchResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Abstract trait for vector database operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Create a new collection with the specified vector dimensions.
    /// Creating a collection that already exists is a no-op.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Check if a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Upsert documents with their embeddings into a collection.
    ///
    /// Documents are identified by their `id` field; an existing id is
    /// replaced. Returns the number of documents written.
    async fn upsert(&self, collection: &str, documents: &[Document]) -> Result<usize>;

    /// Search for similar vectors, sorted by similarity score descending.
    /// Only results with a score of at least `threshold` are returned.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Delete documents by their IDs, returning the number deleted.
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize>;

    /// Count documents in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

// ============================================================================
// In-Memory Vector Store (for testing)
// ============================================================================

/// In-memory vector store using cosine similarity.
///
/// Data is not persisted and is lost when the process exits.
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, InMemoryCollection>>>,
}

struct InMemoryCollection {
    dimensions: usize,
    documents: HashMap<String, Document>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write();
        collections.entry(name.to_string()).or_insert_with(|| {
            InMemoryCollection {
                dimensions,
                documents: HashMap::new(),
            }
        });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write();
        collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", name)))
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().contains_key(name))
    }

    async fn upsert(&self, collection: &str, documents: &[Document]) -> Result<usize> {
        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        for document in documents {
            let embedding = document.embedding.as_ref().ok_or_else(|| {
                AppError::InvalidInput(format!("Document '{}' missing embedding", document.id))
            })?;
            if embedding.len() != coll.dimensions {
                return Err(AppError::InvalidInput(format!(
                    "Document '{}' has {} dimensions, collection expects {}",
                    document.id,
                    embedding.len(),
                    coll.dimensions
                )));
            }
            coll.documents
                .insert(document.id.clone(), document.clone());
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
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        let mut results: Vec<SearchResult> = coll
            .documents
            .values()
            .filter_map(|doc| {
                let doc_embedding = doc.embedding.as_ref()?;
                let score = Self::cosine_similarity(embedding, doc_embedding);
                if score >= threshold {
                    Some(SearchResult {
                        document: doc.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        Ok(results)
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize> {
        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        let mut deleted = 0;
        for id in ids {
            if coll.documents.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;
        Ok(coll.documents.len())
    }
}
