//! Vector index abstraction for Svar.
//!
//! Provides a trait-based interface over nearest-neighbor backends, plus the
//! handle and metadata types that identify a persisted index.

mod memory;
mod sqlite;

pub use memory::MemoryIndex;
pub use sqlite::SqliteIndex;

use crate::dataset::Record;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A dataset record stored in the index together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedRecord {
    /// The source record.
    pub record: Record,
    /// Embedding of the record's prompt.
    pub embedding: Vec<f32>,
    /// When this record was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexedRecord {
    /// Pair a record with its prompt embedding.
    pub fn new(record: Record, embedding: Vec<f32>) -> Self {
        Self {
            record,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A retrieval hit with its similarity score (higher is better).
#[derive(Debug, Clone)]
pub struct Retrieved {
    /// The matched record.
    pub record: IndexedRecord,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// Where the indexed dataset came from.
///
/// Recorded on the index metadata so provenance survives restarts instead
/// of living in session state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexSource {
    /// The bundled demo dataset.
    #[default]
    Default,
    /// A user-supplied dataset.
    Custom,
}

impl std::str::FromStr for IndexSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "demo" => Ok(IndexSource::Default),
            "custom" => Ok(IndexSource::Custom),
            _ => Err(format!("Unknown index source: {}", s)),
        }
    }
}

impl std::fmt::Display for IndexSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexSource::Default => write!(f, "default"),
            IndexSource::Custom => write!(f, "custom"),
        }
    }
}

/// Metadata persisted alongside an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Embedding model the prompts were embedded with.
    pub embedding_model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
    /// Dataset provenance.
    pub source: IndexSource,
    /// Name of the dataset file the index was built from.
    pub dataset: String,
    /// Number of indexed records.
    pub record_count: usize,
    /// When the index was built.
    pub built_at: DateTime<Utc>,
}

/// Explicit reference to a persisted index location.
///
/// Passed through the call chain instead of relying on ambient filesystem
/// state, so multiple independent indexes can coexist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexHandle {
    path: PathBuf,
}

impl IndexHandle {
    /// Create a handle for the given index path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The on-disk location of the index.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an index has been built at this location.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Search for the most similar records.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<Retrieved>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<Retrieved>>;

    /// Get the index metadata.
    async fn meta(&self) -> Result<IndexMeta>;

    /// Get total record count.
    async fn record_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_index_source_round_trip() {
        assert_eq!("custom".parse::<IndexSource>().unwrap(), IndexSource::Custom);
        assert_eq!("default".parse::<IndexSource>().unwrap(), IndexSource::Default);
        assert_eq!(IndexSource::Custom.to_string(), "custom");
        assert!("upstream".parse::<IndexSource>().is_err());
    }

    #[test]
    fn test_handle_exists() {
        let dir = tempfile::tempdir().unwrap();
        let handle = IndexHandle::new(dir.path().join("index.db"));
        assert!(!handle.exists());
    }
}
