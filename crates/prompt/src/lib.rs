//! Prompt system for ragchat.
//!
//! Chat prompts are three parts: a system instruction, an optional history
//! placeholder, and a human message. This crate provides:
//! - YAML prompt definitions under `.ragchat/prompts/`
//! - Built-in rephrase and answer prompts
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{
    answer_prompt, builtin_prompt, rephrase_prompt, ANSWER_PROMPT_ID, REPHRASE_PROMPT_ID,
};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
