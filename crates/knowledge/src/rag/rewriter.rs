//! Query rewriter: folds chat history into a standalone question.

use super::question::{ChatHistory, Question};
use super::to_messages;
use ragchat_core::AppResult;
use ragchat_llm::{LlmClient, LlmRequest};
use ragchat_prompt::{build_prompt, rephrase_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

pub struct QueryRewriter {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt: rephrase_prompt(),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = prompt;
        self
    }

    /// One non-streaming completion; the model's output is the new question.
    ///
    /// Blank output falls back to the original question.
    pub async fn rewrite(&self, question: &Question, history: &ChatHistory) -> AppResult<Question> {
        let mut variables = HashMap::new();
        variables.insert("input".to_string(), question.to_string());

        let built = build_prompt(&self.prompt, variables, history.as_str())?;
        let request = LlmRequest::new(to_messages(built), &self.model);

        tracing::debug!("Rephrasing question with {}", self.llm.provider_name());
        let response = self.llm.complete(&request).await?;

        match Question::parse(&response.content) {
            Ok(standalone) => {
                tracing::info!("Standalone question: {}", standalone);
                Ok(standalone)
            }
            Err(_) => {
                tracing::warn!("Rephrase returned no text, keeping original question");
                Ok(question.clone())
            }
        }
    }
}
