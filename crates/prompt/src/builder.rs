//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use handlebars::Handlebars;
use ragchat_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition, input variables and chat history.
///
/// The system and human templates are rendered with Handlebars. The history
/// is opaque text: it is never rendered as a template, and it becomes the
/// history message only when the definition has a placeholder and the text
/// is not blank.
///
/// # Example
/// ```no_run
/// use ragchat_prompt::{build_prompt, rephrase_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = rephrase_prompt();
/// let mut vars = HashMap::new();
/// vars.insert("input".to_string(), "And its population?".to_string());
///
/// let built = build_prompt(&def, vars, "Human: What is the capital of France?")?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
    history: &str,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = render_template(&definition.system, &variables)?;
    let user = render_template(&definition.human, &variables)?;

    let history = (definition.history_placeholder && !history.trim().is_empty())
        .then(|| history.to_string());

    Ok(BuiltPrompt {
        system,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            history_included: history.is_some(),
            resolved_variables: variables,
        },
        history,
        user,
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
