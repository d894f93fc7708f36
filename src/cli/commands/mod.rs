//! CLI command implementations.

mod config;
mod doctor;
mod summarize;

pub use config::run_config;
pub use doctor::run_doctor;
pub use summarize::run_summarize;
