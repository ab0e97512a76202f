//! Line reassembly for streamed HTTP bodies.
//!
//! Providers stream either newline-delimited JSON (Ollama) or server-sent
//! events (OpenAI). Network chunks do not respect line boundaries, so bytes
//! are buffered until a full line is available.

use crate::client::{LlmStream, LlmStreamChunk};
use futures::{Stream, StreamExt};
use ragchat_core::{AppError, AppResult};
use std::fmt::Display;

/// Buffers bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and drain every complete, non-blank line.
    ///
    /// Trailing `\r` is stripped. A partial trailing line stays buffered.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.trim_end_matches('\r');
            if !line.trim().is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Take whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

/// Payload of a server-sent `data:` line, or `None` for other fields.
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Turn a streamed HTTP body into an [`LlmStream`].
///
/// `parse` sees every complete line and returns `None` for lines that carry
/// no chunk (keep-alives, event names).
pub fn decode_lines<S, B, E, F>(body: S, mut parse: F) -> LlmStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    F: FnMut(&str) -> Option<AppResult<LlmStreamChunk>> + Send + 'static,
{
    let mut decoder = LineDecoder::new();

    let stream = body
        .map(Some)
        .chain(futures::stream::once(futures::future::ready(None)))
        .flat_map(move |item| {
            let chunks: Vec<AppResult<LlmStreamChunk>> = match item {
                Some(Ok(bytes)) => decoder
                    .push(bytes.as_ref())
                    .iter()
                    .filter_map(|line| parse(line.as_str()))
                    .collect(),
                Some(Err(e)) => vec![Err(AppError::Llm(format!("Stream error: {}", e)))],
                None => decoder
                    .finish()
                    .and_then(|line| parse(&line))
                    .into_iter()
                    .collect(),
            };
            futures::stream::iter(chunks)
        });

    Box::pin(stream)
}
