//! Built-in prompt definitions used when the workspace has no override.

use crate::types::PromptDefinition;

/// Turns a follow-up question into a standalone one.
pub const REPHRASE_PROMPT_ID: &str = "rag.rephrase";

/// Answers a question from retrieved context.
pub const ANSWER_PROMPT_ID: &str = "rag.answer";

const REPHRASE_SYSTEM: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, \
formulate a standalone question which can be understood \
without the chat history. Do NOT answer the question, just \
reformulate it if needed and otherwise return it as is.";

const ANSWER_SYSTEM: &str = "You are an assistant for question-answering tasks. Use \
the following pieces of retrieved context to answer the \
question. If you don't know the answer, just say that you \
don't know. Use three sentences maximum and keep the answer \
concise.

{{context}}";

const HUMAN: &str = "{{input}}";

fn definition(id: &str, title: &str, system: &str) -> PromptDefinition {
    PromptDefinition {
        id: id.to_string(),
        title: title.to_string(),
        api_version: "1.0".to_string(),
        system: system.to_string(),
        history_placeholder: true,
        human: HUMAN.to_string(),
    }
}

/// Contextualise a follow-up question without answering it.
pub fn rephrase_prompt() -> PromptDefinition {
    definition(REPHRASE_PROMPT_ID, "Rephrase follow-up question", REPHRASE_SYSTEM)
}

/// Answer in at most three sentences from `{{context}}`.
pub fn answer_prompt() -> PromptDefinition {
    definition(ANSWER_PROMPT_ID, "Answer from retrieved context", ANSWER_SYSTEM)
}

/// Look up a built-in prompt by id.
pub fn builtin_prompt(id: &str) -> Option<PromptDefinition> {
    match id {
        REPHRASE_PROMPT_ID => Some(rephrase_prompt()),
        ANSWER_PROMPT_ID => Some(answer_prompt()),
        _ => None,
    }
}
