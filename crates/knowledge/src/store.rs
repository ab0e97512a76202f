//! Vector store: an embedding provider paired with a vector index.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Document, DocumentChunk, IndexEntry, IngestPolicy, Metadata};
use crate::vector_index::VectorIndex;
use ragchat_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Retriever default k.
pub const DEFAULT_TOP_K: usize = 4;

/// Embeds queries and documents and talks to one vector index.
#[derive(Clone)]
pub struct VectorStore {
    embeddings: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("embeddings", &self.embeddings.model_name())
            .field("index", &self.index.backend_name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl VectorStore {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embeddings,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Number of chunks returned per search (at least 1).
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Embed `query` and return the closest chunks, most similar first.
    pub async fn similarity_search(&self, query: &str) -> AppResult<Vec<DocumentChunk>> {
        let vector = self.embeddings.embed(query).await?;
        let chunks = self.index.query(&vector, self.top_k).await?;

        tracing::debug!(
            "Similarity search on '{}' returned {} chunks",
            self.index.backend_name(),
            chunks.len()
        );

        Ok(chunks)
    }

    /// Embed every document and write them all in a single upsert.
    ///
    /// Returns the number of distinct entries written.
    pub async fn add_documents(
        &self,
        documents: &[Document],
        policy: IngestPolicy,
    ) -> AppResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;

        if vectors.len() != documents.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                documents.len(),
                vectors.len()
            )));
        }

        // Repeated ids within one batch collapse to the last entry.
        let mut entries: Vec<IndexEntry> = Vec::with_capacity(documents.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (doc, vector) in documents.iter().zip(vectors) {
            let entry = IndexEntry {
                id: entry_id(&doc.text, &doc.metadata, policy),
                vector,
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
            };

            match positions.get(&entry.id) {
                Some(&i) => entries[i] = entry,
                None => {
                    positions.insert(entry.id.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }

        if entries.len() < documents.len() {
            tracing::debug!(
                "Collapsed {} duplicate documents in batch",
                documents.len() - entries.len()
            );
        }

        let written = entries.len();
        self.index.upsert(entries).await?;
        Ok(written)
    }
}

/// Entry id under the given policy.
pub fn entry_id(text: &str, metadata: &Metadata, policy: IngestPolicy) -> String {
    match policy {
        IngestPolicy::Append => uuid::Uuid::new_v4().to_string(),
        IngestPolicy::Deduplicate => content_hash(text, metadata),
    }
}

/// SHA-256 of text and metadata, with top-level keys in sorted order.
fn content_hash(text: &str, metadata: &Metadata) -> String {
    let sorted: BTreeMap<&String, &serde_json::Value> = metadata.iter().collect();

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0u8]);
    hasher.update(serde_json::to_string(&sorted).unwrap_or_default().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(page: i64) -> Metadata {
        let mut m = Metadata::new();
        m.insert("page".to_string(), page.into());
        m
    }

    #[test]
    fn test_append_ids_are_unique() {
        let a = entry_id("same", &meta(1), IngestPolicy::Append);
        let b = entry_id("same", &meta(1), IngestPolicy::Append);
        assert_ne!(a, b);
    }

    #[test]
    fn test_dedupe_ids_are_stable() {
        let a = entry_id("same", &meta(1), IngestPolicy::Deduplicate);
        let b = entry_id("same", &meta(1), IngestPolicy::Deduplicate);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_dedupe_ids_depend_on_metadata() {
        let a = entry_id("same", &meta(1), IngestPolicy::Deduplicate);
        let b = entry_id("same", &meta(2), IngestPolicy::Deduplicate);
        assert_ne!(a, b);
    }
}
