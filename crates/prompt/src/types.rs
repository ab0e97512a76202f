//! Prompt types for ragchat.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A chat prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// System instruction template (Handlebars)
    pub system: String,

    /// Whether chat history is placed between system and human messages
    #[serde(rename = "historyPlaceholder", default = "default_true")]
    pub history_placeholder: bool,

    /// Human message template (Handlebars)
    pub human: String,
}

fn default_true() -> bool {
    true
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Rendered system message
    pub system: String,

    /// Chat history message, absent when the history is blank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,

    /// Rendered human message
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Whether a history message was included
    #[serde(rename = "historyIncluded")]
    pub history_included: bool,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: rag.answer
title: Answer
apiVersion: "1.0"
system: "Answer from {{context}}"
human: "{{input}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "rag.answer");
        assert_eq!(def.system, "Answer from {{context}}");
        assert!(def.history_placeholder);
    }

    #[test]
    fn test_history_placeholder_can_be_disabled() {
        let yaml = r#"
id: rag.rephrase
title: Rephrase
apiVersion: "1.0"
system: "Rewrite it"
historyPlaceholder: false
human: "{{input}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(!def.history_placeholder);
    }
}
