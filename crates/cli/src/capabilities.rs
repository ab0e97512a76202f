//! Builds capability handles from configuration.
//!
//! The pipelines never read config themselves; everything they talk to is
//! constructed here and injected.

use ragchat_core::config::{AppConfig, IndexProvider};
use ragchat_core::{AppError, AppResult};
use ragchat_knowledge::{
    create_provider, EmbeddingProvider, LocalIndex, PineconeConfig, PineconeIndex, VectorIndex,
    VectorStore,
};
use ragchat_llm::{create_client, LlmClient};
use std::sync::Arc;
use std::time::Duration;

/// Completion client for the active provider.
pub fn llm_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider = config.provider.as_str();
    let endpoint = config.provider_endpoint(provider);
    let api_key = config.resolve_api_key(provider);

    create_client(
        provider,
        endpoint.as_deref(),
        api_key.as_deref(),
        config.provider_timeout(provider),
    )
}

/// Embedding provider for the active embedding provider.
pub fn embeddings(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let provider = config.embedding_provider.as_str();
    let endpoint = config.provider_endpoint(provider);
    let api_key = config.resolve_api_key(provider);

    create_provider(
        provider,
        &config.embedding_model(),
        endpoint.as_deref(),
        api_key.as_deref(),
        config.provider_timeout(provider),
    )
}

/// Vector index selected by `index.provider`.
pub async fn vector_index(config: &AppConfig) -> AppResult<Arc<dyn VectorIndex>> {
    match config.index.provider {
        IndexProvider::Pinecone => {
            let api_key = config.resolve_index_api_key().ok_or_else(|| {
                AppError::Config(format!(
                    "Pinecone API key not found in environment variable: {}",
                    config.index.api_key_env
                ))
            })?;

            let index = PineconeIndex::connect(PineconeConfig {
                api_key,
                index_name: config.index.name.clone(),
                host: config.index.host.clone(),
                namespace: config.index.namespace.clone(),
                timeout: config.provider_timeout(&config.provider).map(Duration::from_secs),
            })
            .await?;

            Ok(Arc::new(index))
        }
        IndexProvider::Local => {
            let path = config.local_index_path();
            tracing::debug!("Opening local index at {:?}", path);
            Ok(Arc::new(LocalIndex::open(path)?))
        }
    }
}

/// Vector store over the configured embeddings and index.
pub async fn vector_store(config: &AppConfig) -> AppResult<VectorStore> {
    let embeddings = embeddings(config)?;
    let index = vector_index(config).await?;

    Ok(VectorStore::new(embeddings, index).with_top_k(config.index.top_k))
}
