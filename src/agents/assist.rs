//! Framework assistance agent grounded on a pgvector knowledge base.
//!
//! Answers are produced from retrieved documentation chunks only; when
//! retrieval comes back empty the agent says so instead of letting the
//! model improvise. `load_knowledge` is the ingestion side: it chunks,
//! embeds and upserts documents into the store.

use crate::agents::Agent;
use crate::db::VectorStore;
use crate::llm::{EmbeddingClient, LlmClient};
use crate::types::{AgentType, Document, DocumentMetadata, Result, RunConfig};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Collection holding the framework documentation.
pub const KNOWLEDGE_COLLECTION: &str = "assist_knowledge";

const SEARCH_LIMIT: usize = 5;
const SCORE_THRESHOLD: f32 = 0.2;

const CHUNK_WORDS: usize = 300;
const CHUNK_OVERLAP_WORDS: usize = 50;

const SYSTEM_PROMPT: &str = "\
You are a framework assistant. Answer strictly from the documentation \
excerpts provided in the context below. Quote the relevant passage when it \
is short. If the context does not cover the question, say that the \
documentation has no answer for it, do not fall back on general knowledge.";

pub struct AssistAgent {
    llm: Arc<dyn LlmClient>,
    embeddings: Arc<EmbeddingClient>,
    store: Arc<dyn VectorStore>,
}

impl AssistAgent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        embeddings: Arc<EmbeddingClient>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            llm,
            embeddings,
            store,
        }
    }

    /// Ingest documents into the knowledge collection.
    ///
    /// Each `(title, source, content)` entry is split into overlapping
    /// word-window chunks, embedded in one batch, and upserted. Returns
    /// the number of chunks written.
    pub async fn load_knowledge(&self, documents: &[(String, String, String)]) -> Result<usize> {
        self.store
            .create_collection(KNOWLEDGE_COLLECTION, crate::llm::embeddings::EMBEDDING_DIMENSIONS)
            .await?;

        let mut chunks = Vec::new();
        for (title, source, content) in documents {
            for chunk in chunk_text(content, CHUNK_WORDS, CHUNK_OVERLAP_WORDS) {
                chunks.push((title.clone(), source.clone(), chunk));
            }
        }

        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|(_, _, text)| text.clone()).collect();
        let embeddings = self.embeddings.embed(texts).await?;

        let now = Utc::now();
        let docs: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|((title, source, content), embedding)| Document {
                id: Uuid::new_v4().to_string(),
                content,
                metadata: DocumentMetadata {
                    title,
                    source,
                    created_at: now,
                },
                embedding: Some(embedding),
            })
            .collect();

        let written = self.store.upsert(KNOWLEDGE_COLLECTION, &docs).await?;
        tracing::info!(chunks = written, "loaded knowledge base documents");
        Ok(written)
    }

    async fn retrieve_context(&self, query: &str) -> Result<String> {
        if !self.store.collection_exists(KNOWLEDGE_COLLECTION).await? {
            return Ok(String::new());
        }

        let embedding = self.embeddings.embed_one(query).await?;
        let results = self
            .store
            .search(KNOWLEDGE_COLLECTION, &embedding, SEARCH_LIMIT, SCORE_THRESHOLD)
            .await?;

        let context = results
            .iter()
            .map(|r| {
                format!(
                    "## {} ({})\n{}",
                    r.document.metadata.title, r.document.metadata.source, r.document.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(context)
    }
}

#[async_trait]
impl Agent for AssistAgent {
    async fn run(&self, input: &str, _config: &RunConfig) -> Result<String> {
        let context = self.retrieve_context(input).await?;

        if context.is_empty() {
            return Ok(
                "The documentation has no content matching that question yet.".to_string(),
            );
        }

        let system = format!("{}\n\nContext:\n{}", SYSTEM_PROMPT, context);
        self.llm.generate_with_system(&system, input).await
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Assist
    }

    fn name(&self) -> &'static str {
        "Assist"
    }

    fn description(&self) -> &'static str {
        "Answers framework questions from the ingested documentation"
    }
}

/// Split text into overlapping word windows.
fn chunk_text(text: &str, chunk_words: usize, overlap_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    if words.len() <= chunk_words {
        return vec![words.join(" ")];
    }

    let step = chunk_words.saturating_sub(overlap_words).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_words).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_short_text_is_single_chunk() {
        let chunks = chunk_text("one two three", 300, 50);
        assert_eq!(chunks, vec!["one two three".to_string()]);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("   ", 300, 50).is_empty());
    }

    #[test]
    fn test_chunks_overlap() {
        let words: Vec<String> = (0..25).map(|i| format!("w{}", i)).collect();
        let text = words.join(" ");

        let chunks = chunk_text(&text, 10, 3);
        assert!(chunks.len() > 1);
        // Last words of chunk N reappear at the start of chunk N+1.
        assert!(chunks[0].ends_with("w9"));
        assert!(chunks[1].starts_with("w7"));
        // Every word is covered.
        assert!(chunks.last().unwrap().ends_with("w24"));
    }
}
