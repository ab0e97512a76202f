//! Ingest command handler.
//!
//! Loads and splits files, then writes them to the vector index.

use crate::capabilities;
use clap::Args;
use ragchat_core::{config::AppConfig, AppResult};
use ragchat_knowledge::{ingest, load_documents, IngestPolicy, IngestStats};
use std::path::PathBuf;

/// Load documents into the vector index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Characters per chunk (default: ingest.chunkSize)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared by neighbouring chunks (default: ingest.chunkOverlap)
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Derive ids from content so re-ingesting overwrites instead of duplicating
    #[arg(long)]
    pub dedupe: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {} paths", self.paths.len());

        let chunk_size = self.chunk_size.unwrap_or(config.ingest.chunk_size);
        let chunk_overlap = self.chunk_overlap.unwrap_or(config.ingest.chunk_overlap);
        let documents = load_documents(&self.paths, chunk_size, chunk_overlap)?;

        config.ensure_ragchat_dir()?;
        let store = capabilities::vector_store(config).await?;
        let stats = ingest(&store, &documents, self.policy(config)).await?;

        println!("{}", self.summary(&stats)?);
        Ok(())
    }

    fn policy(&self, config: &AppConfig) -> IngestPolicy {
        if self.dedupe || config.ingest.dedupe {
            IngestPolicy::Deduplicate
        } else {
            IngestPolicy::Append
        }
    }

    fn summary(&self, stats: &IngestStats) -> AppResult<String> {
        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "entriesWritten": stats.entries_written,
                "policy": stats.policy,
                "durationSecs": stats.duration_secs,
                "completedAt": stats.completed_at,
            });
            return Ok(serde_json::to_string_pretty(&output)?);
        }

        Ok(format!(
            "Ingested {} documents ({} entries written) in {:.2}s",
            stats.documents, stats.entries_written, stats.duration_secs
        ))
    }
}
