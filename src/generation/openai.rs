//! OpenAI chat-completion generator.

use super::Generator;
use crate::error::{Result, SvarError};
use crate::openai::{create_client, map_api_error};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based generator.
///
/// Runs at zero sampling temperature and without an output-length cap, so
/// answers are as deterministic as the service allows.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIGenerator {
    /// Create a generator for the given chat model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, system, user))]
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| SvarError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user.to_string())
                .build()
                .map_err(|e| SvarError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .build()
            .map_err(|e| SvarError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| map_api_error(e, SvarError::Generation))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| SvarError::Generation("Empty response from model".to_string()))?
            .clone();

        debug!("Generated {} chars", answer.len());
        Ok(answer)
    }
}
