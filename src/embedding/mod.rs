//! Embedding generation for semantic retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
///
/// Build-time and query-time embeddings must come from the same model for
/// their similarity scores to be meaningful; [`Embedder::model_id`] is the
/// pinning key recorded in the index and checked at query time.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identifier of the embedding model, used for model/version pinning.
    fn model_id(&self) -> &str;
}
