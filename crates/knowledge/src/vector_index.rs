//! Vector index abstraction.
//!
//! The index owns chunks and their vectors; callers only query and append.

use crate::types::{DocumentChunk, IndexEntry};
use ragchat_core::AppResult;

/// Trait for vector index backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name for logs (e.g., "pinecone", "local").
    fn backend_name(&self) -> &str;

    /// Return up to `top_k` chunks ordered by descending similarity.
    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<DocumentChunk>>;

    /// Insert or replace entries by id.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> AppResult<()>;

    /// Number of stored entries.
    async fn count(&self) -> AppResult<usize>;
}
