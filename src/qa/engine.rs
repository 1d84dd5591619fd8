//! Question answering engine.

use super::{context::format_context_for_prompt, ContextBuilder, Evidence};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SvarError};
use crate::generation::{Generator, OpenAIGenerator};
use crate::index::{IndexHandle, SqliteIndex, VectorIndex};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Engine answering questions against a built index.
///
/// Each call is stateless: the index is opened fresh from the handle, so a
/// rebuild that lands between questions is picked up transparently.
pub struct QaEngine {
    handle: IndexHandle,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    context_builder: ContextBuilder,
    prompts: Prompts,
}

impl QaEngine {
    /// Create a new engine with explicit components.
    pub fn new(
        handle: IndexHandle,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let context_builder = ContextBuilder::new(embedder.clone());

        Self {
            handle,
            embedder,
            generator,
            context_builder,
            prompts: Prompts::default(),
        }
    }

    /// Create an engine from settings, with an optional model override.
    pub fn from_settings(settings: &Settings, model: Option<&str>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));
        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::new(
            model.unwrap_or(&settings.generation.model),
        ));

        Ok(Self::new(IndexHandle::new(settings.index_path()), embedder, generator)
            .with_prompts(prompts)
            .with_top_k(settings.retrieval.top_k)
            .with_min_score(settings.retrieval.min_score))
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the number of records to retrieve per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.context_builder = self.context_builder.with_top_k(top_k);
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.context_builder = self.context_builder.with_min_score(min_score);
        self
    }

    /// Answer a question against the persisted index.
    ///
    /// Fails with [`SvarError::IndexNotFound`] if no index has been built at
    /// the engine's handle yet.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let index = SqliteIndex::open(&self.handle)?;
        self.answer_with_index(question, &index).await
    }

    /// Answer a question against an already opened index.
    pub async fn answer_with_index(
        &self,
        question: &str,
        index: &dyn VectorIndex,
    ) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SvarError::InvalidInput("Question must not be empty".to_string()));
        }

        info!("Answering question");

        // Build-time and query-time embeddings must share a model, otherwise
        // the similarity scores are meaningless.
        let meta = index.meta().await?;
        if meta.embedding_model != self.embedder.model_id() {
            return Err(SvarError::Embedding(format!(
                "Index was built with embedding model '{}' but the configured model is '{}'; \
                 rebuild the index or change the configuration",
                meta.embedding_model,
                self.embedder.model_id()
            )));
        }
        if meta.dimensions != self.embedder.dimensions() {
            return Err(SvarError::Embedding(format!(
                "Index was built with {}-dimensional embeddings but the configured embedder \
                 produces {}; rebuild the index or change the configuration",
                meta.dimensions,
                self.embedder.dimensions()
            )));
        }

        let evidence = self.context_builder.build(question, index).await?;

        if evidence.is_empty() {
            // Nothing cleared the relevance threshold; decline politely
            // instead of letting the model guess from an empty context.
            debug!("No relevant records found, declining");
            return Ok(Answer {
                text: self.prompts.qa.decline.clone(),
                evidence: Vec::new(),
            });
        }

        let context_text = format_context_for_prompt(&evidence);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context_text);

        let user_prompt = self.prompts.render_with_custom(&self.prompts.qa.user, &vars);

        let text = self
            .generator
            .generate(&self.prompts.qa.system, &user_prompt)
            .await?;

        debug!("Generated answer with {} evidence records", evidence.len());

        // The evidence returned is exactly what the prompt was built from.
        Ok(Answer { text, evidence })
    }
}

/// A generated answer with the evidence it was grounded on.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Answer {
    /// The generated answer text.
    pub text: String,
    /// The retrieved records used to construct the prompt, most relevant first.
    pub evidence: Vec<Evidence>,
}

impl Answer {
    /// Format the answer for terminal display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text.clone();

        if !self.evidence.is_empty() {
            output.push_str("\n\n--- Retrieved evidence ---\n");
            for item in &self.evidence {
                output.push_str(&format!(
                    "\n[row {}] (score: {:.2}) Q: {}\n  A: {}",
                    item.source_row, item.score, item.prompt, item.response
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IndexBuilder;
    use crate::dataset::Record;
    use crate::embedding::fake::HashEmbedder;
    use crate::generation::fake::{CannedGenerator, FailingGenerator};
    use crate::index::{IndexMeta, IndexSource, IndexedRecord, MemoryIndex};
    use chrono::Utc;
    use std::io::Write;
    use std::path::Path;

    fn test_meta(embedder: &HashEmbedder) -> IndexMeta {
        IndexMeta {
            embedding_model: embedder.model_id().to_string(),
            dimensions: embedder.dimensions(),
            source: IndexSource::Custom,
            dataset: "test.csv".to_string(),
            record_count: 0,
            built_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_answer_returns_top_evidence() {
        let embedder = Arc::new(HashEmbedder::new(8));
        let generator = Arc::new(CannedGenerator::new("Yes, EMI is available."));

        let index = MemoryIndex::new(test_meta(&embedder));
        let rec = Record::new(
            "Do you offer EMI options?".to_string(),
            "Yes, EMI is available via our partner.".to_string(),
            1,
        );
        let embedding = embedder.embed(&rec.prompt).await.unwrap();
        index.insert_batch(vec![IndexedRecord::new(rec, embedding)]).unwrap();

        let handle = IndexHandle::new("/nonexistent/never-opened.db");
        let engine = QaEngine::new(handle, embedder, generator.clone()).with_min_score(0.99);

        // Verbatim prompt as the question retrieves that record top-1
        let answer = engine
            .answer_with_index("Do you offer EMI options?", &index)
            .await
            .unwrap();

        assert_eq!(answer.text, "Yes, EMI is available.");
        assert_eq!(answer.evidence.len(), 1);
        assert_eq!(answer.evidence[0].prompt, "Do you offer EMI options?");
        assert!((answer.evidence[0].score - 1.0).abs() < 0.001);

        // The record's response text went into the generation prompt verbatim
        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].1.contains("Yes, EMI is available via our partner."));
        assert!(seen[0].1.contains("Do you offer EMI options?"));
    }

    #[tokio::test]
    async fn test_insufficient_context_declines_without_generation() {
        let embedder = Arc::new(HashEmbedder::new(8));
        let generator = Arc::new(CannedGenerator::new("should never be returned"));

        let index = MemoryIndex::new(test_meta(&embedder));
        let rec = Record::new("Do you offer EMI options?".to_string(), "Yes.".to_string(), 1);
        let embedding = embedder.embed(&rec.prompt).await.unwrap();
        index.insert_batch(vec![IndexedRecord::new(rec, embedding)]).unwrap();

        let handle = IndexHandle::new("/nonexistent/never-opened.db");
        // Threshold above any non-identical match
        let engine = QaEngine::new(handle, embedder, generator.clone()).with_min_score(0.999);

        let answer = engine
            .answer_with_index("What color is the moon?", &index)
            .await
            .unwrap();

        assert!(answer.evidence.is_empty());
        assert_ne!(answer.text, "should never be returned");
        assert!(answer.text.contains("sorry") || answer.text.contains("happy to help"));
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_question_is_invalid_input() {
        let embedder = Arc::new(HashEmbedder::new(8));
        let generator = Arc::new(CannedGenerator::new("nope"));
        let index = MemoryIndex::new(test_meta(&embedder));

        let engine = QaEngine::new(IndexHandle::new("/tmp/x.db"), embedder, generator);
        let err = engine.answer_with_index("   ", &index).await.unwrap_err();
        assert!(matches!(err, SvarError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_embedding_model_mismatch_is_rejected() {
        let build_embedder = HashEmbedder::with_model(8, "model-a");
        let index = MemoryIndex::new(test_meta(&build_embedder));

        let query_embedder = Arc::new(HashEmbedder::with_model(8, "model-b"));
        let generator = Arc::new(CannedGenerator::new("nope"));
        let engine = QaEngine::new(IndexHandle::new("/tmp/x.db"), query_embedder, generator);

        let err = engine
            .answer_with_index("anything at all", &index)
            .await
            .unwrap_err();
        match err {
            SvarError::Embedding(msg) => {
                assert!(msg.contains("model-a"));
                assert!(msg.contains("model-b"));
            }
            other => panic!("expected Embedding error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embedding_dimension_mismatch_is_rejected() {
        // Same model id, different dimensions: variable-dimension models make
        // this a real misconfiguration, and it must not look like "no match"
        let build_embedder = HashEmbedder::with_model(8, "model-a");
        let index = MemoryIndex::new(test_meta(&build_embedder));
        let rec = Record::new("Do you offer EMI options?".to_string(), "Yes.".to_string(), 1);
        let embedding = build_embedder.embed(&rec.prompt).await.unwrap();
        index.insert_batch(vec![IndexedRecord::new(rec, embedding)]).unwrap();

        let query_embedder = Arc::new(HashEmbedder::with_model(4, "model-a"));
        let generator = Arc::new(CannedGenerator::new("nope"));
        let engine = QaEngine::new(IndexHandle::new("/tmp/x.db"), query_embedder, generator);

        let err = engine
            .answer_with_index("Do you offer EMI options?", &index)
            .await
            .unwrap_err();
        match err {
            SvarError::Embedding(msg) => {
                assert!(msg.contains("8-dimensional"));
                assert!(msg.contains('4'));
            }
            other => panic!("expected Embedding error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_answer_before_build_is_index_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(HashEmbedder::new(8));
        let generator = Arc::new(CannedGenerator::new("nope"));

        let engine = QaEngine::new(
            IndexHandle::new(dir.path().join("index.db")),
            embedder,
            generator,
        );

        let err = engine.answer("Do you offer EMI options?").await.unwrap_err();
        assert!(matches!(err, SvarError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces_as_generation_error() {
        let embedder = Arc::new(HashEmbedder::new(8));
        let index = MemoryIndex::new(test_meta(&embedder));
        let rec = Record::new("Do you offer EMI options?".to_string(), "Yes.".to_string(), 1);
        let embedding = embedder.embed(&rec.prompt).await.unwrap();
        index.insert_batch(vec![IndexedRecord::new(rec, embedding)]).unwrap();

        let engine = QaEngine::new(
            IndexHandle::new("/tmp/x.db"),
            embedder,
            Arc::new(FailingGenerator),
        )
        .with_min_score(0.99);

        let err = engine
            .answer_with_index("Do you offer EMI options?", &index)
            .await
            .unwrap_err();
        assert!(matches!(err, SvarError::Generation(_)));
    }

    #[tokio::test]
    async fn test_end_to_end_build_then_answer() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join("faqs.csv");
        let mut file = std::fs::File::create(&dataset_path).unwrap();
        file.write_all(
            b"prompt,response\n\
              Do you offer EMI options?,\"Yes, EMI is available via our partner.\"\n\
              What is the refund policy?,Refunds within 30 days.\n",
        )
        .unwrap();

        let handle = IndexHandle::new(dir.path().join("index.db"));
        let embedder = Arc::new(HashEmbedder::new(8));

        let builder = IndexBuilder::new(embedder.clone());
        builder
            .build(Path::new(&dataset_path), &handle, IndexSource::Custom)
            .await
            .unwrap();

        let generator = Arc::new(CannedGenerator::new("Yes, we offer EMI."));
        let engine = QaEngine::new(handle, embedder, generator).with_min_score(0.99);

        let answer = engine.answer("Do you offer EMI options?").await.unwrap();
        assert!(!answer.evidence.is_empty());
        assert_eq!(answer.evidence[0].prompt, "Do you offer EMI options?");
        assert_eq!(answer.text, "Yes, we offer EMI.");
    }
}
