//! Knowledge type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open metadata mapping attached to documents and chunks.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A document handed to ingestion: text plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,

    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata value.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A chunk read back from the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Index identifier
    pub id: String,

    /// Chunk text
    pub text: String,

    #[serde(default)]
    pub metadata: Metadata,

    /// Similarity score reported by the index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// One (id, vector, text, metadata) record written to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// How entry ids are assigned on ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestPolicy {
    /// Fresh random id per entry; re-ingesting duplicates content.
    #[default]
    Append,

    /// Id derived from text and metadata; re-ingesting overwrites.
    Deduplicate,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Documents received
    pub documents: usize,

    /// Entries written to the index
    pub entries_written: usize,

    pub policy: IngestPolicy,

    pub duration_secs: f64,

    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("Paris is the capital of France.").with_metadata("page", 1);
        assert_eq!(doc.metadata["page"], 1);
    }

    #[test]
    fn test_document_metadata_defaults_to_empty() {
        let doc: Document = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn test_policy_serialization() {
        assert_eq!(
            serde_json::to_string(&IngestPolicy::Deduplicate).unwrap(),
            "\"deduplicate\""
        );
        assert_eq!(IngestPolicy::default(), IngestPolicy::Append);
    }
}
