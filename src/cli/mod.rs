//! CLI module for tubesum.

pub mod commands;
mod output;
mod preview;

pub use output::Output;
pub use preview::{content_preview, print_preview};

use clap::{Parser, Subcommand};

/// tubesum - YouTube video summaries from a local model
///
/// Fetches a video's captions and runs them through analysis, writing and
/// critique stages. Run without a URL to enter interactive mode.
#[derive(Parser, Debug)]
#[command(name = "tubesum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YouTube URL or 11-character video ID
    pub url: Option<String>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Model to use for all stages
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory for summary files
    #[arg(long, global = true)]
    pub output_dir: Option<String>,

    /// Do not print the summary preview
    #[arg(long, global = true)]
    pub no_preview: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the model endpoint, external tools and output directory
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
