//! Local vector index using cosine similarity.
//!
//! Entries live in memory behind a `tokio::sync::RwLock`. When opened with a
//! path, every upsert rewrites the JSON file so the index survives restarts.

use crate::types::{DocumentChunk, IndexEntry};
use crate::vector_index::VectorIndex;
use ragchat_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct LocalIndex {
    /// Insertion order is kept so equal scores rank stably.
    entries: RwLock<Vec<IndexEntry>>,
    path: Option<PathBuf>,
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl LocalIndex {
    /// Empty index that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the index file at `path`, or start empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let entries: Vec<IndexEntry> = serde_json::from_str(&contents).map_err(|e| {
                AppError::Index(format!("Failed to parse local index {:?}: {}", path, e))
            })?;
            tracing::debug!("Loaded {} entries from {:?}", entries.len(), path);
            entries
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, entries: &[IndexEntry]) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Replace atomically.
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(entries)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl VectorIndex for LocalIndex {
    fn backend_name(&self) -> &str {
        "local"
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<DocumentChunk>> {
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, &IndexEntry)> = entries
            .iter()
            .map(|entry| (cosine_similarity(&entry.vector, vector), entry))
            .collect();

        // Stable sort keeps insertion order among ties.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| DocumentChunk {
                id: entry.id.clone(),
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
                score: Some(score),
            })
            .collect())
    }

    async fn upsert(&self, batch: Vec<IndexEntry>) -> AppResult<()> {
        let mut entries = self.entries.write().await;

        // Staged so a failed write leaves the index untouched.
        let mut staged = entries.clone();
        for entry in batch {
            match staged.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => staged.push(entry),
            }
        }

        self.persist(&staged)?;
        *entries = staged;
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;
    use tempfile::TempDir;

    fn entry(id: &str, vector: Vec<f32>, text: &str) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            vector,
            text: text.to_string(),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let index = LocalIndex::in_memory();
        index
            .upsert(vec![
                entry("pasta", vec![-0.3, -0.8, 0.4], "Cooking recipes for pasta"),
                entry("rust", vec![1.0, 0.5, 0.2], "Rust is a systems language"),
                entry("go", vec![0.8, 0.6, 0.1], "Go is a systems language"),
            ])
            .await
            .unwrap();

        let results = index.query(&[0.9, 0.4, 0.3], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "rust");
        assert_eq!(results[1].id, "go");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let index = LocalIndex::in_memory();
        index.upsert(vec![entry("a", vec![1.0], "old")]).await.unwrap();
        index.upsert(vec![entry("a", vec![1.0], "new")]).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let results = index.query(&[1.0], 4).await.unwrap();
        assert_eq!(results[0].text, "new");
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let index = LocalIndex::in_memory();
        assert!(index.query(&[1.0, 0.0], 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_open() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".ragchat/index.json");

        {
            let index = LocalIndex::open(&path).unwrap();
            index
                .upsert(vec![entry("a", vec![1.0, 0.0], "Paris is the capital of France.")])
                .await
                .unwrap();
        }

        let reopened = LocalIndex::open(&path).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let results = reopened.query(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].text, "Paris is the capital of France.");
    }

    #[test]
    fn test_corrupt_file_is_index_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(LocalIndex::open(&path), Err(AppError::Index(_))));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_entries() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let index = LocalIndex::open(blocker.join("index.json")).unwrap();
        let result = index
            .upsert(vec![entry("a", vec![1.0, 0.0], "alpha")])
            .await;

        assert!(result.is_err());
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.query(&[1.0, 0.0], 4).await.unwrap().is_empty());
    }
}
