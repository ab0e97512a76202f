//! Ingestion pipeline behaviour.

use super::fakes::{FailingEmbeddings, RecordingEmbeddings, RecordingIndex};
use crate::embeddings::{EmbeddingProvider, MockEmbeddings};
use crate::indexes::LocalIndex;
use crate::ingest::{ingest, INGEST_FAILED};
use crate::loader::load_documents;
use crate::rag::{Question, Retriever};
use crate::store::VectorStore;
use crate::types::{Document, IngestPolicy};
use crate::vector_index::VectorIndex;
use ragchat_core::AppError;
use std::sync::Arc;

fn local_store() -> VectorStore {
    VectorStore::new(
        Arc::new(MockEmbeddings::default()),
        Arc::new(LocalIndex::in_memory()),
    )
}

fn documents() -> Vec<Document> {
    vec![
        Document::new("Paris is the capital of France.").with_metadata("source", "a.txt"),
        Document::new("The Seine flows through Paris.").with_metadata("source", "b.txt"),
    ]
}

#[tokio::test]
async fn test_every_document_becomes_one_entry() {
    let embeddings = Arc::new(RecordingEmbeddings::default());
    let index = Arc::new(RecordingIndex::default());
    let store = VectorStore::new(embeddings.clone(), index.clone());

    let stats = ingest(&store, &documents(), IngestPolicy::Append).await.unwrap();

    assert_eq!(stats.documents, 2);
    assert_eq!(stats.entries_written, 2);

    let upserts = index.upserts();
    assert_eq!(upserts.len(), 1, "one batch write");

    let entries = &upserts[0];
    let expected = MockEmbeddings::default()
        .embed("Paris is the capital of France.")
        .await
        .unwrap();
    assert_eq!(entries[0].text, "Paris is the capital of France.");
    assert_eq!(entries[0].vector, expected);
    assert_eq!(entries[0].metadata["source"], "a.txt");
    assert_eq!(entries[1].text, "The Seine flows through Paris.");

    assert_eq!(
        embeddings.seen(),
        vec!["Paris is the capital of France.", "The Seine flows through Paris."]
    );
}

#[tokio::test]
async fn test_append_duplicates_and_dedupe_overwrites() {
    let append = local_store();
    ingest(&append, &documents(), IngestPolicy::Append).await.unwrap();
    ingest(&append, &documents(), IngestPolicy::Append).await.unwrap();
    assert_eq!(append.index().count().await.unwrap(), 4);

    let dedupe = local_store();
    ingest(&dedupe, &documents(), IngestPolicy::Deduplicate).await.unwrap();
    ingest(&dedupe, &documents(), IngestPolicy::Deduplicate).await.unwrap();
    assert_eq!(dedupe.index().count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_embedding_failure_writes_nothing() {
    let index = Arc::new(RecordingIndex::default());
    let store = VectorStore::new(Arc::new(FailingEmbeddings), index.clone());

    let err = ingest(&store, &documents(), IngestPolicy::Append).await.unwrap_err();

    assert_eq!(err.to_string(), INGEST_FAILED);
    assert!(matches!(err.root_cause(), AppError::Embedding(m) if m.contains("quota")));
    assert!(index.upserts().is_empty());
}

#[tokio::test]
async fn test_duplicate_documents_in_one_batch_count_once() {
    let store = local_store();
    let mut batch = documents();
    batch.push(batch[0].clone());

    let stats = ingest(&store, &batch, IngestPolicy::Deduplicate).await.unwrap();

    assert_eq!(stats.documents, 3);
    assert_eq!(stats.entries_written, 2);
    assert_eq!(store.index().count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_failed_local_write_leaves_index_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let store = VectorStore::new(
        Arc::new(MockEmbeddings::default()),
        Arc::new(LocalIndex::open(blocker.join("index.json")).unwrap()),
    );

    let err = ingest(&store, &documents(), IngestPolicy::Append).await.unwrap_err();

    assert_eq!(err.to_string(), INGEST_FAILED);
    assert_eq!(store.index().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_index_failure_is_wrapped() {
    let store = VectorStore::new(
        Arc::new(MockEmbeddings::default()),
        Arc::new(RecordingIndex::failing()),
    );

    let err = ingest(&store, &documents(), IngestPolicy::Append).await.unwrap_err();

    assert_eq!(err.to_string(), INGEST_FAILED);
    assert!(matches!(err.root_cause(), AppError::Index(_)));
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    let index = Arc::new(RecordingIndex::default());
    let store = VectorStore::new(Arc::new(FailingEmbeddings), index.clone());

    let stats = ingest(&store, &[], IngestPolicy::Append).await.unwrap();

    assert_eq!(stats.entries_written, 0);
    assert!(index.upserts().is_empty());
}

#[tokio::test]
async fn test_loaded_files_are_retrievable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("france.md"), "Paris is the capital of France.").unwrap();
    std::fs::write(dir.path().join("fruit.md"), "Bananas are rich in potassium.").unwrap();

    let documents = load_documents(&[dir.path().to_path_buf()], 1000, 200).unwrap();
    assert_eq!(documents.len(), 2);

    let store = local_store();
    ingest(&store, &documents, IngestPolicy::Deduplicate).await.unwrap();

    let retrieved = Retriever::new(store.with_top_k(1))
        .retrieve(&Question::parse("What is the capital of France?").unwrap())
        .await
        .unwrap();

    assert_eq!(retrieved.len(), 1);
    assert_eq!(retrieved.chunks()[0].text, "Paris is the capital of France.");
    assert!(retrieved.chunks()[0].metadata["source"]
        .as_str()
        .unwrap()
        .ends_with("france.md"));
}
