//! Configuration module for tubesum.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, StagePrompt};
pub use settings::{
    GeneralSettings, GenerationSettings, OutputSettings, PromptSettings, Settings,
    StageSettings, TranscriptSettings,
};
