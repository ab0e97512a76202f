//! Error types for ragchat.
//!
//! One enum covers every failure class in the workspace. Provider failures
//! (`Llm`, `Embedding`, `Index`) are raised by the capability clients; the
//! pipelines catch them at their boundary and surface a single
//! [`AppError::Pipeline`] that keeps the original error as its source.

use thiserror::Error;

/// Unified error type for ragchat.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index errors
    #[error("Index error: {0}")]
    Index(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Invalid caller input (e.g. a blank question)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic surfaced failure of a pipeline. Only `message` is displayed;
    /// the cause stays reachable through `source()`.
    #[error("{message}")]
    Pipeline {
        message: String,
        #[source]
        source: Box<AppError>,
    },

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Wrap `cause` in a generic pipeline error with a fixed message.
    pub fn pipeline(message: impl Into<String>, cause: AppError) -> Self {
        AppError::Pipeline {
            message: message.into(),
            source: Box::new(cause),
        }
    }

    /// Whether this error came from an external capability provider.
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            AppError::Llm(_) | AppError::Embedding(_) | AppError::Index(_)
        )
    }

    /// Innermost error, unwrapping any pipeline layers.
    pub fn root_cause(&self) -> &AppError {
        let mut current = self;
        while let AppError::Pipeline { source, .. } = current {
            current = source;
        }
        current
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_pipeline_error_hides_cause_in_display() {
        let err = AppError::pipeline(
            "call chain failed to execute",
            AppError::Llm("429 quota exceeded".to_string()),
        );

        assert_eq!(err.to_string(), "call chain failed to execute");
        assert!(!err.to_string().contains("quota"));
    }

    #[test]
    fn test_pipeline_error_keeps_source() {
        let err = AppError::pipeline("failed", AppError::Index("timeout".to_string()));

        let source = err.source().expect("source should be set");
        assert!(source.to_string().contains("timeout"));
        assert!(matches!(err.root_cause(), AppError::Index(_)));
        assert!(err.root_cause().is_provider());
    }

    #[test]
    fn test_root_cause_unwraps_nested_pipelines() {
        let inner = AppError::pipeline("inner", AppError::Embedding("bad key".to_string()));
        let outer = AppError::pipeline("outer", inner);

        match outer.root_cause() {
            AppError::Embedding(msg) => assert_eq!(msg, "bad key"),
            other => panic!("unexpected root cause: {other:?}"),
        }
    }

    #[test]
    fn test_input_error_is_not_provider() {
        assert!(!AppError::Input("empty".to_string()).is_provider());
        assert!(AppError::Llm("x".to_string()).is_provider());
    }
}
