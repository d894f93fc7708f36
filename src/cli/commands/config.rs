//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command. `config_path` is the `--config` override, if any.
pub fn run_config(action: &ConfigAction, config_path: Option<PathBuf>, settings: Settings) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if write_config(&settings, &config_path, *force)? {
                Output::success(&format!("Wrote config to {}", config_path.display()));
            } else {
                Output::warning(&format!(
                    "{} already exists. Use --force to overwrite.",
                    config_path.display()
                ));
            }
        }
    }

    Ok(())
}

/// Write settings unless the file exists and `force` is off. Returns whether it wrote.
///
/// The API key is never written; it stays in the environment.
fn write_config(settings: &Settings, path: &PathBuf, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    let mut settings = settings.clone();
    settings.generation.api_key = None;
    settings.save_to(path)?;
    Ok(true)
}
