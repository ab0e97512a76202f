//! Embedding capability.
//!
//! Turns text into fixed-length vectors for the vector index.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockEmbeddings, OllamaEmbeddings, OpenAiEmbeddings};
