//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::{IndexHandle, SqliteIndex, VectorIndex};
use anyhow::Result;

/// Run the status command.
pub async fn run_status(settings: Settings) -> Result<()> {
    let handle = IndexHandle::new(settings.index_path());

    Output::header("Svar Status");

    if !handle.exists() {
        Output::kv("Index", &handle.path().display().to_string());
        Output::kv("State", "not built");
        println!();
        Output::info("Build one with: svar build <dataset.csv>");
        return Ok(());
    }

    let index = SqliteIndex::open(&handle)?;
    let meta = index.meta().await?;

    Output::kv("Index", &handle.path().display().to_string());
    Output::kv("Dataset", &meta.dataset);
    Output::kv("Source", &meta.source.to_string());
    Output::kv("Records", &meta.record_count.to_string());
    Output::kv("Embedding model", &meta.embedding_model);
    Output::kv("Dimensions", &meta.dimensions.to_string());
    Output::kv("Built at", &meta.built_at.to_rfc3339());

    if meta.embedding_model != settings.embedding.model {
        println!();
        Output::warning(&format!(
            "Configured embedding model '{}' differs from the index; rebuild before asking",
            settings.embedding.model
        ));
    }

    Ok(())
}
