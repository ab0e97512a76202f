//! Embedding provider implementations.

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockEmbeddings;
pub use ollama::OllamaEmbeddings;
pub use openai::OpenAiEmbeddings;
