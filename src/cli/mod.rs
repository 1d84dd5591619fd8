//! CLI module for Svar.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Svar - Retrieval-Grounded FAQ Question Answering
///
/// A CLI tool for answering questions from an FAQ knowledge base, grounded in retrieval.
/// The name "Svar" comes from the Norwegian/Scandinavian word for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Svar and write the default configuration
    Init,

    /// Build (or rebuild) the index from a CSV dataset
    Build {
        /// Path to the dataset CSV (must have 'prompt' and 'response' columns)
        dataset: String,

        /// Dataset provenance recorded in the index (default, custom)
        #[arg(short, long, default_value = "custom")]
        source: String,
    },

    /// Ask a question and get an answer grounded in the indexed dataset
    Ask {
        /// The question to ask
        question: String,

        /// Chat model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,

        /// Number of records to retrieve as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Search the index without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long, default_value = "0.3")]
        min_score: f32,
    },

    /// Show information about the persisted index
    Status,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "retrieval.top_k")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}
