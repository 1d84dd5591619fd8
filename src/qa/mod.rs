//! Question answering with retrieved evidence.
//!
//! Provides the ability to ask questions and get answers grounded in the
//! indexed FAQ records, with the retrieved evidence returned alongside.

pub mod context;
mod engine;

pub use context::ContextBuilder;
pub use engine::{Answer, QaEngine};

use crate::index::Retrieved;

/// One retrieved record as shown to the model and to the user.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Evidence {
    /// The record's question text.
    pub prompt: String,
    /// The record's answer text.
    pub response: String,
    /// Data row the record came from.
    pub source_row: usize,
    /// Similarity score against the question.
    pub score: f32,
}

impl From<Retrieved> for Evidence {
    fn from(result: Retrieved) -> Self {
        Self {
            prompt: result.record.record.prompt,
            response: result.record.record.response,
            source_row: result.record.record.source_row,
            score: result.score,
        }
    }
}
