//! Retrieval-augmented answering.
//!
//! `START -> REWRITING -> RETRIEVING+ANSWERING -> STREAMING -> DONE`, with any
//! failure surfacing as a single pipeline error.

pub mod pipeline;
pub mod question;
pub mod retriever;
pub mod rewriter;
pub mod stream;
pub mod synthesizer;

pub use pipeline::{AnsweringPipeline, PipelineOptions, CHAIN_FAILED};
pub use question::{ChatHistory, Question};
pub use retriever::{RetrievedSet, Retriever, SOURCE_LIMIT};
pub use rewriter::QueryRewriter;
pub use stream::{Answer, AnswerFrame, AnswerStream, ChannelState, SourcesPayload, STREAM_FAILED};
pub use synthesizer::AnswerSynthesizer;

use ragchat_llm::ChatMessage;
use ragchat_prompt::BuiltPrompt;

/// System, optional history, then human.
pub(crate) fn to_messages(built: BuiltPrompt) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(built.system)];
    if let Some(history) = built.history {
        messages.push(ChatMessage::user(history));
    }
    messages.push(ChatMessage::user(built.user));
    messages
}
