//! OpenAI embeddings provider.

use crate::embeddings::EmbeddingProvider;
use ragchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Inputs per request; the API rejects larger arrays.
const MAX_BATCH: usize = 2048;

/// Known output sizes; unknown models fall back to 1536.
fn model_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

#[derive(Debug)]
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiEmbeddings {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: Option<&str>,
        timeout: Option<Duration>,
    ) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            AppError::Embedding(format!("Failed to create HTTP client for OpenAI: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: endpoint
                .unwrap_or(DEFAULT_OPENAI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            dimensions: model_dimensions(DEFAULT_MODEL),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimensions = model_dimensions(&self.model);
        self
    }

    async fn embed_chunk(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to OpenAI: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(AppError::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse OpenAI response: {}", e)))?;

        order_embeddings(body, texts.len())
    }
}

/// Put vectors back in input order and check none are missing.
fn order_embeddings(body: EmbeddingResponse, expected: usize) -> AppResult<Vec<Vec<f32>>> {
    let mut data = body.data;
    if data.len() != expected {
        return Err(AppError::Embedding(format!(
            "OpenAI returned {} embeddings for {} texts",
            data.len(),
            expected
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        debug!(provider = "openai", model = %self.model, batch_size = texts.len(), "embedding batch");

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            embeddings.extend(self.embed_chunk(chunk).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dimensions() {
        let provider = OpenAiEmbeddings::new("sk-test", None, None).unwrap();
        assert_eq!(provider.model_name(), "text-embedding-3-small");
        assert_eq!(provider.dimensions(), 1536);

        let large = provider.with_model("text-embedding-3-large");
        assert_eq!(large.dimensions(), 3072);
    }

    #[test]
    fn test_response_reordered_by_index() {
        let body: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        )
        .unwrap();
        let vectors = order_embeddings(body, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_missing_embeddings_is_error() {
        let body: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#).unwrap();
        assert!(matches!(
            order_embeddings(body, 2),
            Err(AppError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let provider = OpenAiEmbeddings::new("sk-test", Some("http://127.0.0.1:9"), None).unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
