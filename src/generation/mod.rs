//! Answer text generation.
//!
//! The generation service is a capability behind a trait so tests can
//! substitute canned output without network access.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for the given system and user prompts.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}
