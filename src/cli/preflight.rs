//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration and state are available
//! before starting operations that would otherwise fail midway.

use crate::error::{Result, SvarError};
use crate::index::IndexHandle;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Building an index requires an API key for embeddings.
    Build,
    /// Asking questions requires an API key and an existing index.
    Ask,
    /// Search requires an API key (query embedding) and an existing index.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, handle: &IndexHandle) -> Result<()> {
    match operation {
        Operation::Build => {
            check_api_key()?;
        }
        Operation::Ask | Operation::Search => {
            check_api_key()?;
            check_index(handle)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(SvarError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(SvarError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the index file exists on disk.
fn check_index(handle: &IndexHandle) -> Result<()> {
    if handle.exists() {
        Ok(())
    } else {
        Err(SvarError::IndexNotFound(
            handle.path().display().to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_index_missing() {
        let handle = IndexHandle::new("/nonexistent/svar-index.db");
        let err = check_index(&handle).unwrap_err();
        assert!(matches!(err, SvarError::IndexNotFound(_)));
    }

    #[test]
    fn test_check_index_present() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let handle = IndexHandle::new(file.path());
        assert!(check_index(&handle).is_ok());
    }
}
