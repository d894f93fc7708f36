//! OpenAI-compatible chat completions client.

use super::{GenerationRequest, Generator};
use crate::config::GenerationSettings;
use crate::error::{Result, TubesumError};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Key sent when none is configured; local Ollama ignores it.
const PLACEHOLDER_API_KEY: &str = "ollama";

/// Create a client for the configured endpoint with the given HTTP timeout.
pub fn create_client(settings: &GenerationSettings, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.base_url.trim_end_matches('/'))
        .with_api_key(
            settings
                .api_key
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string()),
        );

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Generator backed by an OpenAI-compatible chat endpoint.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAIGenerator {
    /// Create a generator from settings.
    ///
    /// The HTTP timeout is the whole-run ceiling; per-call timeouts are enforced
    /// by the stage runner.
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        let timeout = settings.run_timeout();
        Ok(Self {
            client: create_client(settings, timeout)?,
            model: settings.model.clone(),
            timeout,
        })
    }

    /// List model identifiers served by the endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self.client.models().list().await.map_err(|e| self.map_error(e))?;
        Ok(response.data.into_iter().map(|m| m.id).collect())
    }

    fn map_error(&self, err: OpenAIError) -> TubesumError {
        match err {
            OpenAIError::Reqwest(e) if e.is_timeout() => TubesumError::GenerationTimeout(self.timeout),
            other => TubesumError::GenerationProvider(other.to_string()),
        }
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[allow(deprecated)]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| self.map_error(e))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.clone())
                .build()
                .map_err(|e| self.map_error(e))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()
            .map_err(|e| self.map_error(e))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| self.map_error(e))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TubesumError::GenerationProvider("Empty response from model".to_string()))?
            .clone();

        debug!("Model returned {} characters", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
