//! Prompt templates for Svar.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub qa: QaPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for grounded question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    pub system: String,
    pub user: String,
    /// Canned reply when no relevant record clears the retrieval threshold.
    pub decline: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a customer service assistant answering questions from a knowledge base.

Guidelines:
- Answer the question based on the provided context only
- Be polite and well spoken, as a customer service person would be
- If the context does not contain enough information to answer with confidence, say that you don't know - DO NOT make things up
- When you have to say you don't know, phrase it warmly rather than a blunt "I don't know"; reply like a polite human would"#
                .to_string(),

            user: r#"Below you will be given context and a question. Generate an answer to the question based on the context only.

CONTEXT:
{{context}}

QUESTION: {{question}}"#
                .to_string(),

            decline: "I'm sorry, I couldn't find anything in the knowledge base that covers this. \
                      Could you rephrase your question, or ask about something else? I'd be happy to help."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load QA prompts if file exists
            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        // Start with custom variables, then override with provided vars
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.qa.system.is_empty());
        assert!(prompts.qa.user.contains("{{context}}"));
        assert!(prompts.qa.user.contains("{{question}}"));
        assert!(!prompts.qa.decline.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }
}
