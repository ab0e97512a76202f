//! Configuration management for ragchat.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config files (.ragchat/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Provider credentials and the index identity live here. The pipelines
//! never read configuration themselves; the CLI turns an [`AppConfig`] into
//! capability handles and passes those in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Completion providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Embedding providers the factory knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ragchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider (e.g., "openai", "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Embedding provider (e.g., "openai", "ollama", "mock")
    pub embedding_provider: String,

    /// Explicit API key for the completion provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub json_logs: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Vector index settings
    pub index: IndexConfig,

    /// Ingestion settings
    pub ingest: IngestConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            Self::OpenAI {
                embedding_model, ..
            }
            | Self::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        match self {
            Self::OpenAI { .. } => None,
            Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Which vector index backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexProvider {
    /// Hosted Pinecone index
    Pinecone,
    /// File-backed index under the workspace
    Local,
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_provider")]
    pub provider: IndexProvider,

    /// Pinecone index name
    #[serde(default)]
    pub name: Option<String>,

    /// Pinecone data-plane host; looked up from `name` when absent
    #[serde(default)]
    pub host: Option<String>,

    #[serde(rename = "apiKeyEnv", default = "default_index_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub namespace: Option<String>,

    /// Number of chunks the retriever asks for
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,

    /// Storage file for the local provider (relative to the workspace)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_index_provider() -> IndexProvider {
    IndexProvider::Pinecone
}

fn default_index_api_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}

fn default_top_k() -> usize {
    4
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: default_index_provider(),
            name: None,
            host: None,
            api_key_env: default_index_api_key_env(),
            namespace: None,
            top_k: default_top_k(),
            path: None,
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(rename = "chunkSize", default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(rename = "chunkOverlap", default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Derive entry ids from content so re-ingesting overwrites
    #[serde(default)]
    pub dedupe: bool,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            dedupe: false,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    index: Option<IndexConfig>,
    ingest: Option<IngestConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            embedding_provider: "openai".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            json_logs: false,
            llm: None,
            index: IndexConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `RAGCHAT_WORKSPACE`: Override workspace path
    /// - `RAGCHAT_CONFIG`: Path to config file
    /// - `RAGCHAT_PROVIDER`: Completion provider
    /// - `RAGCHAT_MODEL`: Completion model
    /// - `RAGCHAT_API_KEY`: API key for the completion provider
    /// - `PINECONE_INDEX`: Pinecone index name
    /// - `PINECONE_INDEX_HOST`: Pinecone data-plane host
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ragchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load with an explicit workspace and config file.
    ///
    /// Either argument wins over `RAGCHAT_WORKSPACE` / `RAGCHAT_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace
            .or_else(|| std::env::var("RAGCHAT_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file = config_file
            .or_else(|| std::env::var("RAGCHAT_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.ragchat_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("RAGCHAT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("RAGCHAT_MODEL") {
            config.model = model;
        }

        if let Ok(name) = std::env::var("PINECONE_INDEX") {
            config.index.name = Some(name);
        }

        if let Ok(host) = std::env::var("PINECONE_INDEX_HOST") {
            config.index.host = Some(host);
        }

        config.api_key = std::env::var("RAGCHAT_API_KEY").ok();
        config.log_level = config.log_level.or_else(|| std::env::var("RUST_LOG").ok());

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.json_logs = json;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            result.embedding_provider = llm.active_embedding_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(index) = config_file.index {
            result.index = index;
        }

        if let Some(ingest) = config_file.ingest {
            result.ingest = ingest;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        json_logs: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if json_logs {
            self.json_logs = true;
        }

        self
    }

    /// Get the path to the .ragchat directory.
    pub fn ragchat_dir(&self) -> PathBuf {
        self.workspace.join(".ragchat")
    }

    /// Ensure the .ragchat directory exists.
    pub fn ensure_ragchat_dir(&self) -> AppResult<()> {
        let dir = self.ragchat_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .ragchat directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Get a provider's configuration, if the config file declared one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref()?.providers.get(provider)
    }

    /// Endpoint override for a provider.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Request timeout for a provider, in seconds.
    pub fn provider_timeout(&self, provider: &str) -> Option<u64> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.timeout_secs())
    }

    /// Embedding model for the active embedding provider.
    pub fn embedding_model(&self) -> String {
        if let Some(model) = self
            .get_provider_config(&self.embedding_provider)
            .and_then(|pc| pc.embedding_model())
        {
            return model.to_string();
        }

        match self.embedding_provider.as_str() {
            "ollama" => "nomic-embed-text".to_string(),
            "mock" => "trigram-v1".to_string(),
            _ => "text-embedding-3-small".to_string(),
        }
    }

    /// Resolve the API key for a provider.
    ///
    /// `RAGCHAT_API_KEY` wins for the completion provider; otherwise the
    /// provider's `apiKeyEnv` (default `OPENAI_API_KEY` for OpenAI) is read.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if provider == self.provider {
            if let Some(ref key) = self.api_key {
                return Some(key.clone());
            }
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => Some(api_key_env.clone()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "openai" => Some("OPENAI_API_KEY".to_string()),
            None => None,
        };

        env_var.and_then(|var| std::env::var(var).ok())
    }

    /// Resolve the vector index API key.
    pub fn resolve_index_api_key(&self) -> Option<String> {
        std::env::var(&self.index.api_key_env).ok()
    }

    /// Storage file of the local index.
    pub fn local_index_path(&self) -> PathBuf {
        match self.index.path {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => self.workspace.join(path),
            None => self.ragchat_dir().join("index.json"),
        }
    }

    /// Validate configuration for the active providers and index.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) =
            self.get_provider_config(&self.provider)
        {
            if self.api_key.is_none() && std::env::var(api_key_env).is_err() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    api_key_env
                )));
            }
        }

        if self.index.top_k == 0 {
            return Err(AppError::Config("index.topK must be at least 1".to_string()));
        }

        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(AppError::Config(format!(
                "ingest.chunkOverlap ({}) must be smaller than ingest.chunkSize ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }

        if self.index.provider == IndexProvider::Pinecone
            && self.index.name.is_none()
            && self.index.host.is_none()
        {
            return Err(AppError::Config(
                "Pinecone index requires index.name (or PINECONE_INDEX) or index.host".to_string(),
            ));
        }

        Ok(())
    }
}
