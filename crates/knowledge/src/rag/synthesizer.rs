//! Answer synthesizer: streams an answer grounded in retrieved chunks.

use super::question::{ChatHistory, Question};
use super::retriever::RetrievedSet;
use super::stream::AnswerStream;
use super::to_messages;
use ragchat_core::AppResult;
use ragchat_llm::{LlmClient, LlmRequest};
use ragchat_prompt::{answer_prompt, build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt: answer_prompt(),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = prompt;
        self
    }

    /// Start a streaming completion over all retrieved chunks.
    ///
    /// The returned stream carries `retrieved`, from which it derives the
    /// sources frame.
    pub async fn synthesize(
        &self,
        question: &Question,
        history: &ChatHistory,
        retrieved: RetrievedSet,
    ) -> AppResult<AnswerStream> {
        let mut variables = HashMap::new();
        variables.insert("input".to_string(), question.to_string());
        variables.insert("context".to_string(), retrieved.context());

        let built = build_prompt(&self.prompt, variables, history.as_str())?;
        let request = LlmRequest::new(to_messages(built), &self.model).with_streaming();

        tracing::debug!(
            "Synthesizing answer from {} chunks with {}",
            retrieved.len(),
            self.llm.provider_name()
        );

        let stream = self.llm.stream(&request).await?;
        Ok(AnswerStream::new(stream, retrieved))
    }
}
