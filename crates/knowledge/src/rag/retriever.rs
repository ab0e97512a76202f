//! Retriever: standalone question in, ranked chunks out.

use super::question::Question;
use super::stream::SourcesPayload;
use crate::store::VectorStore;
use crate::types::DocumentChunk;
use ragchat_core::AppResult;

/// Number of chunks surfaced to the caller as sources.
pub const SOURCE_LIMIT: usize = 2;

/// Chunks returned for one query, in the order the index ranked them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedSet {
    chunks: Vec<DocumentChunk>,
}

impl RetrievedSet {
    pub fn new(chunks: Vec<DocumentChunk>) -> Self {
        Self { chunks }
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk texts joined by blank lines; empty when nothing was retrieved.
    pub fn context(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Texts of the first [`SOURCE_LIMIT`] chunks, in retrieved order.
    pub fn sources(&self) -> SourcesPayload {
        SourcesPayload {
            sources: self
                .chunks
                .iter()
                .take(SOURCE_LIMIT)
                .map(|c| c.text.clone())
                .collect(),
        }
    }
}

/// Delegates to the vector store; adds no filtering or reordering.
#[derive(Debug, Clone)]
pub struct Retriever {
    store: VectorStore,
}

impl Retriever {
    pub fn new(store: VectorStore) -> Self {
        Self { store }
    }

    pub async fn retrieve(&self, question: &Question) -> AppResult<RetrievedSet> {
        let chunks = self.store.similarity_search(question.as_str()).await?;
        tracing::info!("Retrieved {} chunks", chunks.len());
        Ok(RetrievedSet::new(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    fn chunk(text: &str) -> DocumentChunk {
        DocumentChunk {
            id: text.to_string(),
            text: text.to_string(),
            metadata: Metadata::new(),
            score: None,
        }
    }

    #[test]
    fn test_sources_are_first_two_in_order() {
        let set = RetrievedSet::new(vec![chunk("c"), chunk("a"), chunk("b")]);
        assert_eq!(set.sources().sources, vec!["c", "a"]);
    }

    #[test]
    fn test_sources_with_fewer_chunks() {
        assert_eq!(RetrievedSet::new(vec![chunk("only")]).sources().sources, vec!["only"]);
        assert!(RetrievedSet::default().sources().sources.is_empty());
    }

    #[test]
    fn test_context_uses_every_chunk() {
        let set = RetrievedSet::new(vec![chunk("one"), chunk("two"), chunk("three")]);
        assert_eq!(set.context(), "one\n\ntwo\n\nthree");
        assert_eq!(RetrievedSet::default().context(), "");
    }
}
