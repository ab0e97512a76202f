//! Answer stream: tokens first, then one sources frame, then close.
//!
//! The ordering is enforced by [`ChannelState`]. Sources are only emitted
//! from `Streaming` after the provider finished, which moves the channel to
//! `MetadataSent`; the next poll closes it. Errors and cancellation close the
//! channel directly, so no sources follow a failure.

use super::retriever::RetrievedSet;
use futures::{Stream, StreamExt};
use ragchat_core::{AppError, AppResult};
use ragchat_llm::LlmStream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Message surfaced when the provider fails after streaming started.
pub const STREAM_FAILED: &str = "answer stream failed";

/// Metadata frame appended after the answer text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesPayload {
    pub sources: Vec<String>,
}

/// One item of the answer stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerFrame {
    Token(String),
    Sources(SourcesPayload),
}

impl AnswerFrame {
    /// Encode as one line of the data-stream protocol: `0:"text"` for
    /// tokens, `2:[{"sources":[...]}]` for the metadata frame.
    pub fn to_data_stream_line(&self) -> AppResult<String> {
        match self {
            AnswerFrame::Token(text) => Ok(format!("0:{}\n", serde_json::to_string(text)?)),
            AnswerFrame::Sources(payload) => {
                Ok(format!("2:{}\n", serde_json::to_string(&[payload])?))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Streaming,
    MetadataSent,
    Closed,
}

/// Answer text and sources collected from a finished stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

pub struct AnswerStream {
    /// `None` once the provider has finished or the stream was cancelled.
    inner: Option<LlmStream>,
    retrieved: RetrievedSet,
    state: ChannelState,
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream")
            .field("state", &self.state)
            .field("retrieved", &self.retrieved.len())
            .finish()
    }
}

impl AnswerStream {
    pub fn new(inner: LlmStream, retrieved: RetrievedSet) -> Self {
        Self {
            inner: Some(inner),
            retrieved,
            state: ChannelState::Streaming,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Every chunk fed to synthesis, not just the surfaced sources.
    pub fn retrieved(&self) -> &RetrievedSet {
        &self.retrieved
    }

    /// Drop the in-flight provider stream and close without sources.
    pub fn cancel(&mut self) {
        if self.state != ChannelState::Closed {
            tracing::info!("Answer stream cancelled");
        }
        self.inner = None;
        self.state = ChannelState::Closed;
    }

    /// Drain the stream into the full answer text and its sources.
    pub async fn into_answer(mut self) -> AppResult<Answer> {
        let mut answer = Answer::default();
        while let Some(frame) = self.next().await {
            match frame? {
                AnswerFrame::Token(token) => answer.text.push_str(&token),
                AnswerFrame::Sources(payload) => answer.sources = payload.sources,
            }
        }
        Ok(answer)
    }

    fn finish(&mut self) -> Poll<Option<AppResult<AnswerFrame>>> {
        self.inner = None;
        self.state = ChannelState::MetadataSent;
        Poll::Ready(Some(Ok(AnswerFrame::Sources(self.retrieved.sources()))))
    }
}

impl Stream for AnswerStream {
    type Item = AppResult<AnswerFrame>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match this.state {
                ChannelState::Closed => return Poll::Ready(None),
                ChannelState::MetadataSent => {
                    this.state = ChannelState::Closed;
                    return Poll::Ready(None);
                }
                ChannelState::Streaming => {}
            }

            let Some(inner) = this.inner.as_mut() else {
                return this.finish();
            };

            match inner.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return this.finish(),
                Poll::Ready(Some(Err(e))) => {
                    tracing::error!("Answer stream failed: {}", e);
                    this.inner = None;
                    this.state = ChannelState::Closed;
                    return Poll::Ready(Some(Err(AppError::pipeline(STREAM_FAILED, e))));
                }
                Poll::Ready(Some(Ok(chunk))) => {
                    if chunk.done {
                        // Completion signal; anything after it is ignored.
                        this.inner = None;
                    }
                    if !chunk.content.is_empty() {
                        return Poll::Ready(Some(Ok(AnswerFrame::Token(chunk.content))));
                    }
                }
            }
        }
    }
}
