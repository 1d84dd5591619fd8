//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, mut settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            set_value(&mut settings, key, value)?;
            settings.save()?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::kv("Config", &Settings::default_config_path().display().to_string());
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Apply a dotted-key assignment to the settings.
fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "general.data_dir" => settings.general.data_dir = value.to_string(),
        "general.log_level" => settings.general.log_level = value.to_string(),
        "embedding.model" => settings.embedding.model = value.to_string(),
        "embedding.dimensions" => settings.embedding.dimensions = value.parse()?,
        "index.path" => settings.index.path = value.to_string(),
        "retrieval.top_k" => settings.retrieval.top_k = value.parse()?,
        "retrieval.min_score" => settings.retrieval.min_score = value.parse()?,
        "generation.model" => settings.generation.model = value.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. See 'svar config show' for available keys.",
            key
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_top_k() {
        let mut settings = Settings::default();
        set_value(&mut settings, "retrieval.top_k", "8").unwrap();
        assert_eq!(settings.retrieval.top_k, 8);
    }

    #[test]
    fn test_set_value_unknown_key() {
        let mut settings = Settings::default();
        assert!(set_value(&mut settings, "nope.nope", "1").is_err());
    }

    #[test]
    fn test_set_value_bad_number() {
        let mut settings = Settings::default();
        assert!(set_value(&mut settings, "retrieval.top_k", "lots").is_err());
    }
}
