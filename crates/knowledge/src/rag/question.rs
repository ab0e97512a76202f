//! Request-scoped inputs: the user's question and the chat history blob.

use ragchat_core::{AppError, AppResult};
use std::fmt;

/// A normalized, non-blank question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Normalize `raw` and reject it if nothing is left.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let normalized = Self::normalize(raw);
        if normalized.is_empty() {
            return Err(AppError::Input("Question must not be empty".to_string()));
        }
        Ok(Self(normalized))
    }

    /// Trim surrounding whitespace and turn every line break (LF, CRLF or a
    /// lone CR) into a space.
    ///
    /// Idempotent: `normalize(normalize(s)) == normalize(s)`.
    pub fn normalize(raw: &str) -> String {
        raw.trim()
            .replace("\r\n", " ")
            .replace(|c| c == '\r' || c == '\n', " ")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Question {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Prior exchanges, serialized by the caller as one opaque text blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory(String);

impl ChatHistory {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when there is nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for ChatHistory {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for ChatHistory {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}
