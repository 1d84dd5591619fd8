//! FAQ dataset model and CSV ingestion.
//!
//! A dataset is a delimited file with a header row containing at least the
//! `prompt` and `response` columns (case-sensitive). Any additional columns
//! are retained as record metadata.

use crate::error::{Result, SvarError};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

/// Column holding the retrieval key. Embedded at build time.
pub const PROMPT_COLUMN: &str = "prompt";

/// Column holding the grounding text returned as evidence.
pub const RESPONSE_COLUMN: &str = "response";

/// One question/answer pair from the source dataset.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Record {
    /// Unique record ID.
    pub id: Uuid,
    /// The question text, used as the retrieval key.
    pub prompt: String,
    /// The answer text, returned as grounding context.
    pub response: String,
    /// 1-based data row this record came from (excluding the header).
    pub source_row: usize,
    /// Any additional columns from the dataset.
    pub extra: HashMap<String, String>,
}

impl Record {
    /// Create a new record.
    pub fn new(prompt: String, response: String, source_row: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt,
            response,
            source_row,
            extra: HashMap::new(),
        }
    }
}

/// Load all records from a CSV dataset.
///
/// Fails with [`SvarError::Schema`] if either required column is missing and
/// with [`SvarError::Parse`] on the first malformed row. The whole load is
/// all-or-nothing: a bad row aborts it rather than being skipped.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| SvarError::Parse(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| SvarError::Parse(format!("Failed to read header row: {}", e)))?
        .clone();

    let prompt_idx = headers
        .iter()
        .position(|h| h == PROMPT_COLUMN)
        .ok_or_else(|| missing_column(PROMPT_COLUMN, &headers))?;
    let response_idx = headers
        .iter()
        .position(|h| h == RESPONSE_COLUMN)
        .ok_or_else(|| missing_column(RESPONSE_COLUMN, &headers))?;

    let mut records = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let source_row = i + 1;
        let row = row.map_err(|e| {
            SvarError::Parse(format!("Malformed row {}: {}", source_row, e))
        })?;

        let prompt = row
            .get(prompt_idx)
            .ok_or_else(|| SvarError::Parse(format!("Row {} has no prompt field", source_row)))?
            .trim()
            .to_string();
        let response = row
            .get(response_idx)
            .ok_or_else(|| SvarError::Parse(format!("Row {} has no response field", source_row)))?
            .trim()
            .to_string();

        if prompt.is_empty() {
            return Err(SvarError::Parse(format!(
                "Row {} has an empty prompt; every record needs one",
                source_row
            )));
        }

        if response.is_empty() {
            warn!("Row {} has an empty response; indexing it anyway", source_row);
        }

        let mut record = Record::new(prompt, response, source_row);
        for (idx, header) in headers.iter().enumerate() {
            if idx == prompt_idx || idx == response_idx {
                continue;
            }
            if let Some(value) = row.get(idx) {
                record.extra.insert(header.to_string(), value.to_string());
            }
        }

        records.push(record);
    }

    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Count records with an empty response (flagged, not rejected).
pub fn empty_response_count(records: &[Record]) -> usize {
    records.iter().filter(|r| r.response.is_empty()).count()
}

fn missing_column(name: &str, headers: &csv::StringRecord) -> SvarError {
    SvarError::Schema(format!(
        "Required column '{}' not found. Dataset has: [{}]",
        name,
        headers.iter().collect::<Vec<_>>().join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_dataset() {
        let file = write_csv(
            "prompt,response\n\
             Do you offer EMI options?,\"Yes, EMI is available via our partner.\"\n\
             What is the refund policy?,Refunds within 30 days.\n",
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prompt, "Do you offer EMI options?");
        assert_eq!(records[0].response, "Yes, EMI is available via our partner.");
        assert_eq!(records[0].source_row, 1);
        assert_eq!(records[1].source_row, 2);
    }

    #[test]
    fn test_missing_prompt_column_is_schema_error() {
        let file = write_csv("question,response\nhello,world\n");

        let err = load_records(file.path()).unwrap_err();
        assert!(matches!(err, SvarError::Schema(_)), "got: {err:?}");
    }

    #[test]
    fn test_missing_response_column_is_schema_error() {
        let file = write_csv("prompt,answer\nhello,world\n");

        let err = load_records(file.path()).unwrap_err();
        assert!(matches!(err, SvarError::Schema(_)));
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let file = write_csv("Prompt,Response\nhello,world\n");

        let err = load_records(file.path()).unwrap_err();
        assert!(matches!(err, SvarError::Schema(_)));
    }

    #[test]
    fn test_malformed_row_aborts_load() {
        // Second row has an unterminated quote
        let file = write_csv("prompt,response\nok,fine\n\"broken,row\n");

        let err = load_records(file.path()).unwrap_err();
        assert!(matches!(err, SvarError::Parse(_)), "got: {err:?}");
    }

    #[test]
    fn test_empty_prompt_is_parse_error() {
        let file = write_csv("prompt,response\n,orphan answer\n");

        let err = load_records(file.path()).unwrap_err();
        assert!(matches!(err, SvarError::Parse(_)));
    }

    #[test]
    fn test_empty_response_is_flagged_not_rejected() {
        let file = write_csv("prompt,response\nDo you ship abroad?,\n");

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(empty_response_count(&records), 1);
    }

    #[test]
    fn test_extra_columns_kept_as_metadata() {
        let file = write_csv("prompt,response,category\nHi?,Hello.,greetings\n");

        let records = load_records(file.path()).unwrap();
        assert_eq!(records[0].extra.get("category").unwrap(), "greetings");
    }
}
