//! SQLite-based vector index implementation.
//!
//! The durable index artifact: records with their embeddings plus a single
//! metadata row describing how the index was built. Cosine similarity is
//! computed in Rust for simplicity; for large datasets consider the
//! sqlite-vec extension or a dedicated vector database.

use super::{cosine_similarity, IndexHandle, IndexMeta, IndexSource, IndexedRecord, Retrieved, VectorIndex};
use crate::dataset::Record;
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id TEXT PRIMARY KEY,
    prompt TEXT NOT NULL,
    response TEXT NOT NULL,
    source_row INTEGER NOT NULL,
    extra TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS index_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    embedding_model TEXT NOT NULL,
    dimensions INTEGER NOT NULL,
    source TEXT NOT NULL,
    dataset TEXT NOT NULL,
    record_count INTEGER NOT NULL,
    built_at TEXT NOT NULL
);
"#;

/// SQLite-based vector index.
#[derive(Debug)]
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Create a fresh index file at the given path and write its metadata.
    ///
    /// Used by the builder against a scratch path before the atomic swap.
    #[instrument(skip_all)]
    pub fn create(path: &Path, meta: &IndexMeta) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO index_meta
            (id, embedding_model, dimensions, source, dataset, record_count, built_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                meta.embedding_model,
                meta.dimensions as i64,
                meta.source.to_string(),
                meta.dataset,
                meta.record_count as i64,
                meta.built_at.to_rfc3339(),
            ],
        )?;

        info!("Created index at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a previously built index.
    ///
    /// Fails with [`SvarError::IndexNotFound`] if nothing has been built at
    /// the handle's location yet.
    #[instrument(skip_all, fields(path = %handle.path().display()))]
    pub fn open(handle: &IndexHandle) -> Result<Self> {
        if !handle.exists() {
            return Err(SvarError::IndexNotFound(
                handle.path().display().to_string(),
            ));
        }

        let conn = Connection::open(handle.path())?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Bulk insert records in a single transaction.
    #[instrument(skip(self, records))]
    pub fn insert_batch(&self, records: &[IndexedRecord]) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;

        let tx = conn.unchecked_transaction()?;

        for rec in records {
            let embedding_bytes = Self::embedding_to_bytes(&rec.embedding);
            let extra_json = serde_json::to_string(&rec.record.extra)?;

            tx.execute(
                r#"
                INSERT OR REPLACE INTO records
                (id, prompt, response, source_row, extra, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    rec.record.id.to_string(),
                    rec.record.prompt,
                    rec.record.response,
                    rec.record.source_row as i64,
                    extra_json,
                    embedding_bytes,
                    rec.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Inserted {} records", records.len());
        Ok(records.len())
    }

    /// Flush WAL content into the main database file.
    ///
    /// Called before the builder renames the scratch file into place, so the
    /// swapped artifact is self-contained.
    pub fn checkpoint(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexedRecord> {
        use rusqlite::types::Type;

        let id_str: String = row.get(0)?;
        let extra_json: String = row.get(4)?;
        let embedding_bytes: Vec<u8> = row.get(5)?;
        let indexed_at_str: String = row.get(6)?;
        let source_row: i64 = row.get(3)?;

        // A row that does not decode is corruption, not a miss
        let id = uuid::Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        let extra = serde_json::from_str(&extra_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        let indexed_at = DateTime::parse_from_rfc3339(&indexed_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        Ok(IndexedRecord {
            record: Record {
                id,
                prompt: row.get(1)?,
                response: row.get(2)?,
                source_row: source_row as usize,
                extra,
            },
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at,
        })
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<Retrieved>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<Retrieved>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, prompt, response, source_row, extra, embedding, indexed_at
                FROM records
                "#,
            )
            .map_err(|e| SvarError::Search(e.to_string()))?;

        let records: Vec<IndexedRecord> = stmt
            .query_map([], Self::row_to_record)
            .and_then(|rows| rows.collect())
            .map_err(|e| SvarError::Search(e.to_string()))?;

        let mut results: Vec<Retrieved> = records
            .into_iter()
            .map(|rec| {
                let score = cosine_similarity(query_embedding, &rec.embedding);
                Retrieved { record: rec, score }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        // Sort by score descending
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching records", results.len());
        Ok(results)
    }

    async fn meta(&self) -> Result<IndexMeta> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;

        let meta = conn
            .query_row(
                r#"
                SELECT embedding_model, dimensions, source, dataset, record_count, built_at
                FROM index_meta WHERE id = 1
                "#,
                [],
                |row| {
                    let dimensions: i64 = row.get(1)?;
                    let source_str: String = row.get(2)?;
                    let record_count: i64 = row.get(4)?;
                    let built_at_str: String = row.get(5)?;
                    Ok(IndexMeta {
                        embedding_model: row.get(0)?,
                        dimensions: dimensions as usize,
                        source: source_str.parse().unwrap_or(IndexSource::Custom),
                        dataset: row.get(3)?,
                        record_count: record_count as usize,
                        built_at: DateTime::parse_from_rfc3339(&built_at_str)
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    SvarError::Search("Index has no metadata row".to_string())
                }
                other => SvarError::Search(other.to_string()),
            })?;

        Ok(meta)
    }

    async fn record_count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SvarError::Search(format!("Failed to acquire lock: {}", e)))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_meta(count: usize) -> IndexMeta {
        IndexMeta {
            embedding_model: "test-model".to_string(),
            dimensions: 3,
            source: IndexSource::Default,
            dataset: "faqs.csv".to_string(),
            record_count: count,
            built_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_index_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        let index = SqliteIndex::create(&path, &test_meta(1)).unwrap();

        let rec = IndexedRecord::new(
            Record::new(
                "Do you offer EMI options?".to_string(),
                "Yes, EMI is available via our partner.".to_string(),
                1,
            ),
            vec![1.0, 0.0, 0.0],
        );
        index.insert_batch(&[rec]).unwrap();
        drop(index);

        // Reopen and verify the record and embedding survived losslessly
        let handle = IndexHandle::new(&path);
        let reopened = SqliteIndex::open(&handle).unwrap();

        let results = reopened.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].record.record.prompt, "Do you offer EMI options?");
        assert_eq!(
            results[0].record.record.response,
            "Yes, EMI is available via our partner."
        );
        assert_eq!(results[0].record.embedding, vec![1.0, 0.0, 0.0]);

        let meta = reopened.meta().await.unwrap();
        assert_eq!(meta.embedding_model, "test-model");
        assert_eq!(meta.record_count, 1);
        assert_eq!(meta.source, IndexSource::Default);
    }

    #[tokio::test]
    async fn test_open_missing_index_is_index_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handle = IndexHandle::new(dir.path().join("nope.db"));

        let err = SqliteIndex::open(&handle).unwrap_err();
        assert!(matches!(err, SvarError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_row_surfaces_search_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        let index = SqliteIndex::create(&path, &test_meta(1)).unwrap();
        let rec = IndexedRecord::new(
            Record::new("q".to_string(), "a".to_string(), 1),
            vec![1.0, 0.0, 0.0],
        );
        index.insert_batch(&[rec]).unwrap();
        drop(index);

        // Damage the stored id out from under the reader
        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE records SET id = 'not-a-uuid'", []).unwrap();
        drop(conn);

        let reopened = SqliteIndex::open(&IndexHandle::new(&path)).unwrap();
        let err = reopened.search(&[1.0, 0.0, 0.0], 10).await.unwrap_err();
        assert!(matches!(err, SvarError::Search(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn test_threshold_excludes_weak_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let index = SqliteIndex::create(&path, &test_meta(2)).unwrap();

        let strong = IndexedRecord::new(
            Record::new("strong".to_string(), "a".to_string(), 1),
            vec![1.0, 0.0, 0.0],
        );
        let weak = IndexedRecord::new(
            Record::new("weak".to_string(), "b".to_string(), 2),
            vec![0.0, 1.0, 0.0],
        );
        index.insert_batch(&[strong, weak]).unwrap();

        let results = index
            .search_with_threshold(&[1.0, 0.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.record.prompt, "strong");
    }
}
