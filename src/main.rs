//! Svar CLI entry point.

use anyhow::Result;
use clap::Parser;
use svar::cli::{commands, Cli, Commands};
use svar::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("svar={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Build { dataset, source } => {
            commands::run_build(dataset, source, settings).await?;
        }

        Commands::Ask {
            question,
            model,
            top_k,
        } => {
            commands::run_ask(question, model.clone(), *top_k, settings).await?;
        }

        Commands::Search {
            query,
            limit,
            min_score,
        } => {
            commands::run_search(query, *limit, *min_score, settings).await?;
        }

        Commands::Status => {
            commands::run_status(settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
