//! Text generation.
//!
//! The stage runner talks to a [`Generator`]; the production implementation
//! targets any OpenAI-compatible chat endpoint, such as a local Ollama.

mod openai;

pub use openai::{create_client, OpenAIGenerator};

use crate::error::Result;
use async_trait::async_trait;

/// A single generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Role description, sent as the system message.
    pub system: String,
    /// Stage prompt, sent as the user message.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Trait for text-generation services.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Identifier of the model behind this generator.
    fn model(&self) -> &str;
}
