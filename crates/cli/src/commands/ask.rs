//! Ask command handler.
//!
//! Runs the answering pipeline and renders the answer stream as it arrives.

use crate::capabilities;
use clap::{Args, ValueEnum};
use futures::StreamExt;
use ragchat_core::{config::AppConfig, AppError, AppResult};
use ragchat_knowledge::{
    Answer, AnswerFrame, AnsweringPipeline, ChatHistory, PipelineOptions, SourcesPayload,
};
use ragchat_prompt::{resolve_prompt, ANSWER_PROMPT_ID, REPHRASE_PROMPT_ID};
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

/// How the answer stream is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Answer text, then a numbered source list
    Text,
    /// One protocol line per frame: `0:"token"`, then `2:[{"sources":[...]}]`
    DataStream,
    /// A single JSON object once the stream has finished
    Json,
}

/// Ask a question against the indexed documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Prior conversation, passed verbatim to the prompts
    #[arg(long, conflicts_with = "history_file")]
    pub history: Option<String>,

    /// Read prior conversation from a file
    #[arg(long)]
    pub history_file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Number of chunks to retrieve (default: index.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Rephrase the question even without history
    #[arg(long)]
    pub always_rephrase: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let history = self.load_history()?;

        let llm = capabilities::llm_client(config)?;
        let mut store = capabilities::vector_store(config).await?;
        if let Some(top_k) = self.top_k {
            store = store.with_top_k(top_k);
        }

        let rephrase = resolve_prompt(&config.workspace, REPHRASE_PROMPT_ID)?;
        let answer = resolve_prompt(&config.workspace, ANSWER_PROMPT_ID)?;

        let pipeline = AnsweringPipeline::new(llm, &config.model, store)
            .with_prompts(rephrase, answer)
            .with_options(PipelineOptions {
                always_rephrase: self.always_rephrase,
            });

        let mut stream = unless_interrupted(
            pipeline.call_chain(&self.question, &history),
            tokio::signal::ctrl_c(),
        )
        .await?;

        let mut renderer = Renderer::new(self.format, std::io::stdout().lock());
        let mut cancelled = false;

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(frame) => renderer.frame(frame?)?,
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    stream.cancel();
                    tracing::warn!("Interrupted, answer stream released");
                    cancelled = true;
                    break;
                }
            }
        }

        renderer.finish(&self.question, &config.provider, &config.model)?;
        if cancelled {
            return Err(interrupted());
        }
        Ok(())
    }

    fn load_history(&self) -> AppResult<ChatHistory> {
        match (&self.history, &self.history_file) {
            (Some(text), _) => Ok(ChatHistory::new(text.as_str())),
            (None, Some(path)) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Input(format!("Failed to read history file {:?}: {}", path, e))
                })?;
                Ok(ChatHistory::new(text))
            }
            (None, None) => Ok(ChatHistory::empty()),
        }
    }
}

fn interrupted() -> AppError {
    AppError::Other("Interrupted".to_string())
}

/// Run `work` unless `interrupt` resolves first, in which case the work is
/// dropped and the command fails.
async fn unless_interrupted<T, I>(
    work: impl Future<Output = AppResult<T>>,
    interrupt: impl Future<Output = I>,
) -> AppResult<T> {
    tokio::select! {
        result = work => result,
        _ = interrupt => {
            tracing::warn!("Interrupted before the answer started");
            Err(interrupted())
        }
    }
}

/// Writes answer frames in one [`OutputFormat`].
struct Renderer<W: Write> {
    format: OutputFormat,
    out: W,
    answer: Answer,
    sources_seen: bool,
}

impl<W: Write> Renderer<W> {
    fn new(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            out,
            answer: Answer::default(),
            sources_seen: false,
        }
    }

    fn frame(&mut self, frame: AnswerFrame) -> AppResult<()> {
        match self.format {
            OutputFormat::DataStream => {
                self.out.write_all(frame.to_data_stream_line()?.as_bytes())?;
                self.out.flush()?;
            }
            OutputFormat::Text => match &frame {
                AnswerFrame::Token(token) => {
                    write!(self.out, "{}", token)?;
                    self.out.flush()?;
                }
                AnswerFrame::Sources(payload) => self.write_sources(payload)?,
            },
            OutputFormat::Json => {}
        }

        match frame {
            AnswerFrame::Token(token) => self.answer.text.push_str(&token),
            AnswerFrame::Sources(payload) => {
                self.sources_seen = true;
                self.answer.sources = payload.sources;
            }
        }
        Ok(())
    }

    fn write_sources(&mut self, payload: &SourcesPayload) -> AppResult<()> {
        writeln!(self.out)?;
        if payload.sources.is_empty() {
            return Ok(());
        }

        writeln!(self.out, "\nSources:")?;
        for (i, source) in payload.sources.iter().enumerate() {
            writeln!(self.out, "[{}] {}", i + 1, source.trim())?;
        }
        Ok(())
    }

    fn finish(mut self, question: &str, provider: &str, model: &str) -> AppResult<()> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "question": question,
                    "answer": self.answer.text,
                    "sources": self.answer.sources,
                    "complete": self.sources_seen,
                    "provider": provider,
                    "model": model,
                });
                writeln!(self.out, "{}", serde_json::to_string_pretty(&output)?)?;
            }
            // Interrupted text output still needs its trailing newline.
            OutputFormat::Text if !self.sources_seen => writeln!(self.out)?,
            _ => {}
        }
        self.out.flush()?;
        Ok(())
    }
}
