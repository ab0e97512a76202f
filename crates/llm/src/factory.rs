//! LLM provider factory.
//!
//! Builds a completion client from a provider name plus the endpoint, key
//! and timeout resolved from configuration.

use crate::client::LlmClient;
use crate::providers::{ollama, openai, OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use ragchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by hosted providers
/// * `timeout` - Optional request timeout in seconds
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required key
/// is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Option<u64>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let timeout = timeout.map(Duration::from_secs);

    tracing::debug!(provider = %provider_type, endpoint = ?endpoint, "Creating LLM client");

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(ollama::DEFAULT_OLLAMA_URL);
            let client = match timeout {
                Some(t) => OllamaClient::with_timeout(base_url, t)?,
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let base_url = endpoint.unwrap_or(openai::DEFAULT_OPENAI_URL);
            let client = match timeout {
                Some(t) => OpenAiClient::with_timeout(base_url, api_key, t)?,
                None => OpenAiClient::with_base_url(base_url, api_key),
            };
            Ok(Arc::new(client))
        }
    }
}
