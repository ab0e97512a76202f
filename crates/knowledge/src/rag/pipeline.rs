//! Answering pipeline: rewrite, retrieve, then stream the answer.

use super::question::{ChatHistory, Question};
use super::retriever::Retriever;
use super::rewriter::QueryRewriter;
use super::stream::AnswerStream;
use super::synthesizer::AnswerSynthesizer;
use crate::store::VectorStore;
use ragchat_core::{AppError, AppResult};
use ragchat_llm::LlmClient;
use ragchat_prompt::PromptDefinition;
use std::sync::Arc;

/// Message surfaced for every failure before streaming starts.
pub const CHAIN_FAILED: &str = "call chain failed to execute";

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Call the rephrase model even when there is no history.
    pub always_rephrase: bool,
}

pub struct AnsweringPipeline {
    rewriter: QueryRewriter,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    options: PipelineOptions,
}

impl AnsweringPipeline {
    /// Pipeline that uses one completion client and model for both steps.
    pub fn new(llm: Arc<dyn LlmClient>, model: &str, store: VectorStore) -> Self {
        Self::from_parts(
            QueryRewriter::new(Arc::clone(&llm), model),
            Retriever::new(store),
            AnswerSynthesizer::new(llm, model),
        )
    }

    pub fn from_parts(
        rewriter: QueryRewriter,
        retriever: Retriever,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            rewriter,
            retriever,
            synthesizer,
            options: PipelineOptions::default(),
        }
    }

    /// Replace the rephrase and answer prompts.
    pub fn with_prompts(mut self, rephrase: PromptDefinition, answer: PromptDefinition) -> Self {
        self.rewriter = self.rewriter.with_prompt(rephrase);
        self.synthesizer = self.synthesizer.with_prompt(answer);
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Answer `question` given `history`.
    ///
    /// A blank question is rejected with `AppError::Input`. Any other failure
    /// before the stream is handed back is logged and returned as a pipeline
    /// error wrapping the cause.
    pub async fn call_chain(
        &self,
        question: &str,
        history: &ChatHistory,
    ) -> AppResult<AnswerStream> {
        let question = Question::parse(question)?;

        tracing::info!("Answering: {}", question);

        match self.run(&question, history).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                tracing::error!("Call chain failed: {}", e);
                Err(AppError::pipeline(CHAIN_FAILED, e))
            }
        }
    }

    async fn run(&self, question: &Question, history: &ChatHistory) -> AppResult<AnswerStream> {
        let standalone = if history.is_blank() && !self.options.always_rephrase {
            tracing::debug!("No chat history, skipping rephrase");
            question.clone()
        } else {
            self.rewriter.rewrite(question, history).await?
        };

        let retrieved = self.retriever.retrieve(&standalone).await?;

        self.synthesizer
            .synthesize(question, history, retrieved)
            .await
    }
}
