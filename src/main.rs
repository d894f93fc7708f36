//! tubesum CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubesum::cli::{commands, Cli, Commands};
use tubesum::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration, then environment and flag overrides
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut settings = Settings::load_from(config_path.as_ref())?;
    settings.apply_env()?;

    if let Some(model) = &cli.model {
        settings.generation.model = model.clone();
    }
    if let Some(dir) = &cli.output_dir {
        settings.output.dir = dir.clone();
    }
    if cli.no_preview {
        settings.output.preview = false;
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubesum={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Execute command
    match &cli.command {
        Some(Commands::Doctor) => {
            commands::run_doctor(&settings).await?;
        }

        Some(Commands::Config { action }) => {
            commands::run_config(action, config_path, settings)?;
        }

        None => {
            commands::run_summarize(cli.url.as_deref(), settings).await?;
        }
    }

    Ok(())
}
