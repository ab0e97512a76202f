//! Ingestion pipeline: embed documents and write them to the index.

use crate::store::VectorStore;
use crate::types::{Document, IngestPolicy, IngestStats};
use chrono::Utc;
use ragchat_core::{AppError, AppResult};
use std::time::Instant;

/// Message surfaced for every ingestion failure.
pub const INGEST_FAILED: &str = "failed to load documents";

/// Embed `documents` and write them to the store's index in one batch.
///
/// All-or-nothing: any embedding or index error aborts the batch and is
/// returned as a pipeline error wrapping the cause. An empty batch is a
/// no-op.
pub async fn ingest(
    store: &VectorStore,
    documents: &[Document],
    policy: IngestPolicy,
) -> AppResult<IngestStats> {
    let start = Instant::now();

    tracing::info!(
        "Ingesting {} documents into '{}' ({:?})",
        documents.len(),
        store.index().backend_name(),
        policy
    );

    let entries_written = match store.add_documents(documents, policy).await {
        Ok(written) => written,
        Err(e) => {
            tracing::error!("Ingestion failed: {}", e);
            return Err(AppError::pipeline(INGEST_FAILED, e));
        }
    };

    let duration = start.elapsed();

    tracing::info!(
        "Ingestion completed: {} entries in {:.2}s",
        entries_written,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        documents: documents.len(),
        entries_written,
        policy,
        duration_secs: duration.as_secs_f64(),
        completed_at: Utc::now(),
    })
}
