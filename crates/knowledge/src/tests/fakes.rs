//! Scripted stand-ins for the completion, embedding and index capabilities.

use crate::embeddings::{EmbeddingProvider, MockEmbeddings};
use crate::types::{DocumentChunk, IndexEntry, Metadata};
use crate::vector_index::VectorIndex;
use futures::StreamExt;
use ragchat_core::{AppError, AppResult};
use ragchat_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Completion client that replays canned output and records every request.
#[derive(Default)]
pub struct FakeLlm {
    pub rephrased: String,
    pub tokens: Vec<String>,
    pub fail_complete: bool,
    pub fail_stream: bool,
    /// Yield this many tokens, then a provider error.
    pub fail_after: Option<usize>,
    pub complete_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl FakeLlm {
    pub fn answering(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_rephrase(mut self, text: &str) -> Self {
        self.rephrased = text.to_string();
        self
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if self.fail_complete {
            return Err(AppError::Llm("rephrase model unavailable".to_string()));
        }

        Ok(LlmResponse {
            content: self.rephrased.clone(),
            model: request.model.clone(),
            usage: LlmUsage::default(),
            done: true,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if self.fail_stream {
            return Err(AppError::Llm("401 Unauthorized".to_string()));
        }

        let model = request.model.clone();
        let mut chunks: Vec<AppResult<LlmStreamChunk>> = self
            .tokens
            .iter()
            .map(|t| Ok(LlmStreamChunk::token(t.as_str(), model.as_str())))
            .collect();

        match self.fail_after {
            Some(n) => {
                chunks.truncate(n);
                chunks.push(Err(AppError::Llm("connection reset".to_string())));
            }
            None => chunks.push(Ok(LlmStreamChunk::finished(model, None))),
        }

        Ok(futures::stream::iter(chunks).boxed())
    }
}

/// Index that returns fixed chunks and records writes.
#[derive(Default)]
pub struct RecordingIndex {
    pub chunks: Vec<DocumentChunk>,
    pub fail: bool,
    pub upserts: Mutex<Vec<Vec<IndexEntry>>>,
    pub queries: AtomicUsize,
}

impl RecordingIndex {
    pub fn with_texts(texts: &[&str]) -> Self {
        Self {
            chunks: texts
                .iter()
                .enumerate()
                .map(|(i, text)| DocumentChunk {
                    id: format!("chunk-{}", i),
                    text: text.to_string(),
                    metadata: Metadata::new(),
                    score: Some(1.0 - i as f32 * 0.1),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn upserts(&self) -> Vec<Vec<IndexEntry>> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl VectorIndex for RecordingIndex {
    fn backend_name(&self) -> &str {
        "recording"
    }

    async fn query(&self, _vector: &[f32], top_k: usize) -> AppResult<Vec<DocumentChunk>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Index("index unreachable".to_string()));
        }
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Index("index unreachable".to_string()));
        }
        self.upserts.lock().unwrap().push(entries);
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.upserts.lock().unwrap().iter().map(Vec::len).sum())
    }
}

/// Mock embeddings that remember every text they were asked to embed.
#[derive(Debug, Default)]
pub struct RecordingEmbeddings {
    inner: MockEmbeddings,
    pub seen: Mutex<Vec<String>>,
}

impl RecordingEmbeddings {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for RecordingEmbeddings {
    fn provider_name(&self) -> &str {
        "recording"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.seen.lock().unwrap().extend(texts.iter().cloned());
        self.inner.embed_batch(texts).await
    }
}

/// Embeddings that always fail.
#[derive(Debug)]
pub struct FailingEmbeddings;

#[async_trait::async_trait]
impl EmbeddingProvider for FailingEmbeddings {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding("quota exceeded".to_string()))
    }
}
