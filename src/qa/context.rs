//! Context building for grounded answers.

use super::Evidence;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::VectorIndex;
use std::sync::Arc;

/// Retrieves the evidence records for a question.
pub struct ContextBuilder {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    min_score: f32,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            top_k: 4,
            min_score: 0.3,
        }
    }

    /// Set the number of records to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Embed the question and retrieve the top matching records.
    ///
    /// The returned evidence is ordered most relevant first and bounded by
    /// the configured top-k.
    pub async fn build(&self, question: &str, index: &dyn VectorIndex) -> Result<Vec<Evidence>> {
        let query_embedding = self.embedder.embed(question).await?;

        let results = index
            .search_with_threshold(&query_embedding, self.top_k, self.min_score)
            .await?;

        Ok(results.into_iter().map(Evidence::from).collect())
    }
}

/// Format evidence records for inclusion in the generation prompt.
///
/// The retrieved prompt/response text goes in verbatim so the model only
/// ever sees what the dataset actually says.
pub fn format_context_for_prompt(evidence: &[Evidence]) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "---\n[{}] Q: {}\nA: {}\n---",
                i + 1,
                item.prompt,
                item.response
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context_is_verbatim() {
        let evidence = vec![
            Evidence {
                prompt: "Do you offer EMI options?".to_string(),
                response: "Yes, EMI is available via our partner.".to_string(),
                source_row: 1,
                score: 0.98,
            },
            Evidence {
                prompt: "What is the refund policy?".to_string(),
                response: "Refunds within 30 days.".to_string(),
                source_row: 2,
                score: 0.61,
            },
        ];

        let text = format_context_for_prompt(&evidence);
        assert!(text.contains("[1] Q: Do you offer EMI options?"));
        assert!(text.contains("A: Yes, EMI is available via our partner."));
        assert!(text.contains("[2] Q: What is the refund policy?"));
    }
}
