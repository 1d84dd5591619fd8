//! In-memory vector index implementation.
//!
//! Useful for testing and ephemeral datasets.

use super::{cosine_similarity, IndexMeta, IndexedRecord, Retrieved, VectorIndex};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector index.
pub struct MemoryIndex {
    records: RwLock<Vec<IndexedRecord>>,
    meta: RwLock<IndexMeta>,
}

impl MemoryIndex {
    /// Create a new in-memory index with the given metadata.
    pub fn new(meta: IndexMeta) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            meta: RwLock::new(meta),
        }
    }

    /// Insert a batch of records, updating the record count in the metadata.
    pub fn insert_batch(&self, records: Vec<IndexedRecord>) -> Result<usize> {
        let mut store = self
            .records
            .write()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;
        store.extend(records);

        let count = store.len();
        drop(store);

        let mut meta = self
            .meta
            .write()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;
        meta.record_count = count;

        Ok(count)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<Retrieved>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<Retrieved>> {
        let records = self
            .records
            .read()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;

        let mut results: Vec<Retrieved> = records
            .iter()
            .map(|rec| {
                let score = cosine_similarity(query_embedding, &rec.embedding);
                Retrieved {
                    record: rec.clone(),
                    score,
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn meta(&self) -> Result<IndexMeta> {
        let meta = self
            .meta
            .read()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;
        Ok(meta.clone())
    }

    async fn record_count(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use crate::index::IndexSource;
    use chrono::Utc;

    fn test_meta() -> IndexMeta {
        IndexMeta {
            embedding_model: "test-model".to_string(),
            dimensions: 3,
            source: IndexSource::Custom,
            dataset: "test.csv".to_string(),
            record_count: 0,
            built_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_index_search_ordering() {
        let index = MemoryIndex::new(test_meta());

        let rec1 = IndexedRecord::new(
            Record::new("Do you offer EMI options?".to_string(), "Yes.".to_string(), 1),
            vec![1.0, 0.0, 0.0],
        );
        let rec2 = IndexedRecord::new(
            Record::new("What is the refund policy?".to_string(), "30 days.".to_string(), 2),
            vec![0.0, 1.0, 0.0],
        );

        index.insert_batch(vec![rec1, rec2]).unwrap();
        assert_eq!(index.record_count().await.unwrap(), 2);

        let results = index.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].record.record.prompt, "Do you offer EMI options?");
    }

    #[tokio::test]
    async fn test_memory_index_threshold_filters() {
        let index = MemoryIndex::new(test_meta());

        let rec = IndexedRecord::new(
            Record::new("hello".to_string(), "world".to_string(), 1),
            vec![0.0, 1.0, 0.0],
        );
        index.insert_batch(vec![rec]).unwrap();

        // Orthogonal query scores 0.0, below the threshold
        let results = index
            .search_with_threshold(&[1.0, 0.0, 0.0], 10, 0.3)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_insert_updates_meta_count() {
        let index = MemoryIndex::new(test_meta());
        let rec = IndexedRecord::new(
            Record::new("q".to_string(), "a".to_string(), 1),
            vec![1.0, 0.0, 0.0],
        );
        index.insert_batch(vec![rec]).unwrap();

        assert_eq!(index.meta().await.unwrap().record_count, 1);
    }
}
