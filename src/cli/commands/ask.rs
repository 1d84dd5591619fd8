//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::index::IndexHandle;
use crate::qa::QaEngine;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    top_k: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let handle = IndexHandle::new(settings.index_path());

    if let Err(e) = preflight::check(Operation::Ask, &handle) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let mut engine = QaEngine::from_settings(&settings, model.as_deref())?;
    if let Some(k) = top_k {
        engine = engine.with_top_k(k);
    }

    let spinner = Output::spinner("Searching knowledge base...");

    match engine.answer(question).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.text);

            if !answer.evidence.is_empty() {
                Output::header("Evidence");
                for (rank, item) in answer.evidence.iter().enumerate() {
                    Output::evidence(rank + 1, item.score, &item.prompt, item.source_row);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
