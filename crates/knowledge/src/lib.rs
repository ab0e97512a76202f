//! Retrieval-augmented question answering over a vector index.
//!
//! Two pipelines share one [`VectorStore`]:
//!
//! - [`ingest`] embeds documents and writes them to the index.
//! - [`AnsweringPipeline`] rewrites a follow-up question, retrieves chunks
//!   and streams an answer followed by its sources.

pub mod embeddings;
pub mod indexes;
pub mod ingest;
pub mod loader;
pub mod rag;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use embeddings::{create_provider, EmbeddingProvider};
pub use indexes::{LocalIndex, PineconeConfig, PineconeIndex};
pub use ingest::{ingest, INGEST_FAILED};
pub use loader::load_documents;
pub use rag::{
    Answer, AnswerFrame, AnswerStream, AnsweringPipeline, ChannelState, ChatHistory,
    PipelineOptions, Question, RetrievedSet, SourcesPayload, CHAIN_FAILED, STREAM_FAILED,
};
pub use store::{VectorStore, DEFAULT_TOP_K};
pub use types::{Document, DocumentChunk, IndexEntry, IngestPolicy, IngestStats, Metadata};
pub use vector_index::VectorIndex;
