//! LLM integration crate for ragchat.
//!
//! A provider-agnostic chat completion interface with one-shot and
//! streaming calls.
//!
//! # Providers
//! - **OpenAI**: chat completions API and compatible servers
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use ragchat_llm::{ChatMessage, LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new(vec![ChatMessage::user("Hello, world!")], "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod lines;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk,
    LlmUsage,
};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
