//! Init command - first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Svar Setup");
    println!();
    println!("Welcome to Svar! Let's make sure everything is configured correctly.\n");

    // Step 1: Check API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if std::env::var("OPENAI_API_KEY").is_err() {
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!();
        println!("  Svar requires an OpenAI API key for embeddings and answer generation.");
        println!(
            "  Get your API key from: {}",
            style("https://platform.openai.com/api-keys").underlined()
        );
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'svar init' again.");
            return Ok(());
        }
    } else {
        Output::success("OpenAI API key is configured!");
    }

    println!();

    // Step 2: Create directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Inspect your config with: {}", style("svar config show").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!(
        "  {} Build an index from your FAQ dataset",
        style("svar build <dataset.csv>").cyan()
    );
    println!(
        "  {} Ask a question against it",
        style("svar ask \"<question>\"").cyan()
    );
    println!("  {} Check index status", style("svar status").cyan());
    println!();
    println!("For more help: {}", style("svar --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
