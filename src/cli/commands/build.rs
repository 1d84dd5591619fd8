//! Build command implementation.

use crate::builder::IndexBuilder;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::index::{IndexHandle, IndexSource};
use anyhow::Result;
use std::path::Path;

/// Run the build command.
pub async fn run_build(dataset: &str, source: &str, settings: Settings) -> Result<()> {
    let handle = IndexHandle::new(settings.index_path());

    if let Err(e) = preflight::check(Operation::Build, &handle) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let dataset_path = Path::new(dataset);
    if !dataset_path.exists() {
        Output::error(&format!("Dataset not found: {}", dataset));
        anyhow::bail!("Dataset not found: {}", dataset);
    }

    let source: IndexSource = source
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let builder = IndexBuilder::from_settings(&settings);

    let replacing = handle.exists();
    let spinner = Output::spinner(&format!("Indexing {}...", dataset));

    match builder.build(dataset_path, &handle, source).await {
        Ok(report) => {
            spinner.finish_and_clear();
            Output::success(&format!(
                "Indexed {} records from {}",
                report.records_indexed, report.dataset
            ));
            if report.empty_responses > 0 {
                Output::warning(&format!(
                    "{} records have an empty response",
                    report.empty_responses
                ));
            }
            if replacing {
                Output::info("Replaced the previous index.");
            }
            Output::kv("Index", &handle.path().display().to_string());
            Output::kv("Source", &report.source.to_string());
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Build failed: {}", e));
            if replacing {
                Output::info("The previous index is untouched.");
            }
            return Err(e.into());
        }
    }

    Ok(())
}
