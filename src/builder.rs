//! Index building for Svar.
//!
//! Builds a fresh vector index from a CSV dataset and atomically replaces
//! any previously persisted index. The build is all-or-nothing: parse and
//! embedding failures leave the prior index untouched, because all writes go
//! to a scratch file that is only renamed into place on success.

use crate::config::Settings;
use crate::dataset::{self, empty_response_count};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SvarError};
use crate::index::{IndexHandle, IndexMeta, IndexSource, IndexedRecord, SqliteIndex};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Builds persisted vector indexes from FAQ datasets.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
}

impl IndexBuilder {
    /// Create a builder using the given embedder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Create a builder with the embedder configured in settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )))
    }

    /// Build an index from a dataset, replacing whatever the handle points at.
    ///
    /// Readers keep seeing the previous index until the final rename lands;
    /// a half-written index is never observable at the handle's path.
    #[instrument(skip(self), fields(dataset = %dataset_path.display()))]
    pub async fn build(
        &self,
        dataset_path: &Path,
        handle: &IndexHandle,
        source: IndexSource,
    ) -> Result<BuildReport> {
        let records = dataset::load_records(dataset_path)?;
        if records.is_empty() {
            return Err(SvarError::InvalidInput(format!(
                "Dataset {} has no data rows",
                dataset_path.display()
            )));
        }

        let empty_responses = empty_response_count(&records);
        if empty_responses > 0 {
            warn!("{} records have an empty response", empty_responses);
        }

        info!("Embedding {} prompts", records.len());
        let prompts: Vec<String> = records.iter().map(|r| r.prompt.clone()).collect();
        let embeddings = self.embedder.embed_batch(&prompts).await?;

        if embeddings.len() != records.len() {
            return Err(SvarError::Embedding(format!(
                "Expected {} embeddings, got {}",
                records.len(),
                embeddings.len()
            )));
        }

        let indexed: Vec<IndexedRecord> = records
            .into_iter()
            .zip(embeddings)
            .map(|(record, embedding)| IndexedRecord::new(record, embedding))
            .collect();

        let dataset_name = dataset_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dataset_path.display().to_string());

        let meta = IndexMeta {
            embedding_model: self.embedder.model_id().to_string(),
            dimensions: self.embedder.dimensions(),
            source,
            dataset: dataset_name.clone(),
            record_count: indexed.len(),
            built_at: Utc::now(),
        };

        let count = indexed.len();
        self.persist(handle, &meta, &indexed)?;

        info!("Indexed {} records at {:?}", count, handle.path());

        Ok(BuildReport {
            records_indexed: count,
            empty_responses,
            dataset: dataset_name,
            source,
        })
    }

    /// Write the index to a scratch file next to the target, then atomically
    /// rename it over the handle path.
    fn persist(
        &self,
        handle: &IndexHandle,
        meta: &IndexMeta,
        records: &[IndexedRecord],
    ) -> Result<()> {
        let parent = handle
            .path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        // Same directory as the target so the rename stays on one filesystem
        let scratch = tempfile::Builder::new()
            .prefix(".svar-build-")
            .suffix(".db")
            .tempfile_in(parent)?;
        let scratch_path = scratch.path().to_path_buf();

        let index = SqliteIndex::create(&scratch_path, meta)?;
        index.insert_batch(records)?;
        index.checkpoint()?;
        drop(index);

        // Stale WAL sidecars from a previous index must not outlive the swap
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = handle.path().as_os_str().to_owned();
            sidecar.push(suffix);
            let sidecar = std::path::PathBuf::from(sidecar);
            if sidecar.exists() {
                std::fs::remove_file(&sidecar)?;
            }
        }

        scratch
            .persist(handle.path())
            .map_err(|e| SvarError::Io(e.error))?;

        Ok(())
    }
}

/// Result of a successful index build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Number of records indexed.
    pub records_indexed: usize,
    /// Records indexed with an empty response (flagged at load time).
    pub empty_responses: usize,
    /// Name of the dataset file.
    pub dataset: String,
    /// Dataset provenance recorded in the index metadata.
    pub source: IndexSource,
}
