//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::index::{IndexHandle, SqliteIndex};
use crate::qa::ContextBuilder;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    min_score: f32,
    settings: Settings,
) -> Result<()> {
    let handle = IndexHandle::new(settings.index_path());

    if let Err(e) = preflight::check(Operation::Search, &handle) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let index = SqliteIndex::open(&handle)?;

    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));

    let context_builder = ContextBuilder::new(embedder)
        .with_top_k(limit)
        .with_min_score(min_score);

    let spinner = Output::spinner("Searching...");

    let results = context_builder.build(query, &index).await;
    spinner.finish_and_clear();

    match results {
        Ok(evidence) => {
            if evidence.is_empty() {
                Output::warning("No records found matching your query.");
            } else {
                Output::success(&format!("Found {} records", evidence.len()));

                for (rank, item) in evidence.iter().enumerate() {
                    Output::search_result(rank + 1, item.score, &item.prompt, &item.response);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
