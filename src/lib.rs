//! tubesum - YouTube video summaries from a local model
//!
//! A local-first CLI tool that turns a YouTube video into a structured,
//! self-critiqued summary using its published captions and an
//! OpenAI-compatible model endpoint (a local Ollama by default).
//!
//! # Overview
//!
//! A run goes through five steps:
//! - Resolve a URL or bare ID to a canonical video ID
//! - Fetch the caption transcript
//! - Run the analysis, writing and critique stages in order
//! - Extract a structured summary from the stage outputs
//! - Persist the result as JSON and Markdown
//!
//! # Architecture
//!
//! - `video` - Video reference parsing and metadata lookup
//! - `transcript` - Caption retrieval
//! - `generation` - Text-generation client
//! - `stages` - The three-stage runner
//! - `extract` - Structured summary extraction
//! - `persist` - Output files
//! - `orchestrator` - Pipeline coordination
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use tubesum::config::Settings;
//! use tubesum::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut settings = Settings::load()?;
//!     settings.apply_env()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.summarize("https://youtu.be/dQw4w9WgXcQ").await?;
//!     println!("{}", report.summary().executive_summary);
//!     println!("Saved to {}", report.paths.json.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod generation;
pub mod orchestrator;
pub mod persist;
pub mod stages;
pub mod transcript;
pub mod video;

pub use error::{Result, TubesumError};
