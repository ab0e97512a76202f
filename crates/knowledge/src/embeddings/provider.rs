//! Embedding provider trait and factory.

use ragchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

use super::providers::{MockEmbeddings, OllamaEmbeddings, OpenAiEmbeddings};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, one vector per text in order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider by name.
///
/// # Arguments
/// * `provider` - "openai", "ollama" or "mock"
/// * `model` - Model identifier
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by "openai"
/// * `timeout` - Optional request timeout in seconds
pub fn create_provider(
    provider: &str,
    model: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Option<u64>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let timeout = timeout.map(Duration::from_secs);

    match provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockEmbeddings::default())),

        "openai" => {
            let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::Config("OpenAI embeddings require an API key".to_string())
            })?;
            let provider = OpenAiEmbeddings::new(api_key, endpoint, timeout)?.with_model(model);
            Ok(Arc::new(provider))
        }

        "ollama" => Ok(Arc::new(OllamaEmbeddings::new(model, endpoint, timeout)?)),

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, ollama, mock",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider("mock", "trigram-v1", None, None, None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_openai_provider() {
        let provider =
            create_provider("openai", "text-embedding-3-small", None, Some("sk-test"), None)
                .unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.dimensions(), 1536);
    }

    #[test]
    fn test_openai_requires_key() {
        let result = create_provider("openai", "text-embedding-3-small", None, None, None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider("gguf", "x", None, None, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider("mock", "trigram-v1", None, None, None).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
