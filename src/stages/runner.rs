//! Sequential stage runner with per-call timeouts and a single retry.

use super::{StageContext, StageKind, StageOutput};
use crate::config::{Prompts, Settings, StageSettings};
use crate::error::TubesumError;
use crate::generation::{GenerationRequest, Generator};
use crate::transcript::TranscriptText;
use crate::video::VideoMetadata;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Calls per stage: the first attempt plus one retry.
const MAX_ATTEMPTS: u32 = 2;

/// Characters of transcript shown to the critique stage.
const CRITIQUE_EXCERPT_CHARS: usize = 500;

/// Runs the analysis, writing and critique stages in order.
pub struct StageRunner {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    temperatures: StageSettings,
    max_tokens: u32,
    call_timeout: Duration,
    run_timeout: Duration,
}

impl StageRunner {
    /// Create a runner using the generation and stage settings.
    pub fn new(generator: Arc<dyn Generator>, prompts: Prompts, settings: &Settings) -> Self {
        Self {
            generator,
            prompts,
            temperatures: settings.stages.clone(),
            max_tokens: settings.generation.max_tokens,
            call_timeout: settings.generation.call_timeout(),
            run_timeout: settings.generation.run_timeout(),
        }
    }

    /// Override the per-call and whole-run timeouts.
    pub fn with_timeouts(mut self, call_timeout: Duration, run_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self.run_timeout = run_timeout;
        self
    }

    /// Run every stage. Never fails: a stage that cannot produce text is
    /// recorded as failed or skipped and the next stage still runs.
    #[instrument(skip_all, fields(video_id = %transcript.video_id))]
    pub async fn run(&self, transcript: &TranscriptText, metadata: &VideoMetadata) -> StageContext {
        let deadline = Instant::now() + self.run_timeout;
        let mut context = StageContext::new();
        let mut next = Some(StageKind::Analysis);

        while let Some(stage) = next {
            let output = if Instant::now() >= deadline {
                warn!("Run deadline reached, skipping {} stage", stage);
                StageOutput::skipped(stage, "run deadline reached")
            } else {
                self.run_stage(stage, &context, transcript, metadata, deadline).await
            };

            context.push(output);
            next = stage.next();
        }

        context
    }

    async fn run_stage(
        &self,
        stage: StageKind,
        context: &StageContext,
        transcript: &TranscriptText,
        metadata: &VideoMetadata,
        deadline: Instant,
    ) -> StageOutput {
        let request = self.build_request(stage, context, transcript, metadata);
        let started = Instant::now();
        let mut attempts = 0;
        let mut last_error = None;

        info!("Running {} stage", stage);

        while attempts < MAX_ATTEMPTS {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                last_error.get_or_insert(TubesumError::GenerationTimeout(self.run_timeout));
                break;
            }

            attempts += 1;
            let budget = self.call_timeout.min(remaining);

            let result = match tokio::time::timeout(budget, self.generator.generate(&request)).await {
                Ok(Ok(text)) if text.trim().is_empty() => Err(TubesumError::GenerationProvider(
                    "model returned an empty response".to_string(),
                )),
                Ok(result) => result,
                Err(_) => Err(TubesumError::GenerationTimeout(budget)),
            };

            match result {
                Ok(text) => {
                    return StageOutput::completed(stage, text, attempts, elapsed_ms(started));
                }
                Err(e) => {
                    warn!("{} stage attempt {} failed: {}", stage, attempts, e);
                    last_error = Some(e);
                }
            }
        }

        let error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt made".to_string());
        StageOutput::failed(stage, error, attempts, elapsed_ms(started))
    }

    /// Build the generation request for a stage from the context so far.
    pub fn build_request(
        &self,
        stage: StageKind,
        context: &StageContext,
        transcript: &TranscriptText,
        metadata: &VideoMetadata,
    ) -> GenerationRequest {
        let prompt = self.prompts.for_stage(stage);

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), metadata.title.clone());
        vars.insert("channel".to_string(), metadata.channel.clone());
        vars.insert("video_id".to_string(), metadata.video_id.clone());
        vars.insert("context".to_string(), stage_context(stage, context, transcript, metadata));
        vars.insert(
            "transcript_excerpt".to_string(),
            transcript.excerpt(CRITIQUE_EXCERPT_CHARS),
        );

        GenerationRequest {
            system: self.prompts.render_with_custom(&prompt.role, &vars),
            prompt: self.prompts.render_with_custom(&prompt.instructions, &vars),
            temperature: self.temperatures.temperature(stage),
            max_tokens: self.max_tokens,
        }
    }
}

/// Source header plus whatever earlier stages produced. The analysis stage, and
/// any later stage whose predecessors all failed, works from the transcript.
fn stage_context(
    stage: StageKind,
    context: &StageContext,
    transcript: &TranscriptText,
    metadata: &VideoMetadata,
) -> String {
    let header = format!("Video Title: {}\nChannel: {}", metadata.title, metadata.channel);

    if stage == StageKind::Analysis || !context.has_completed_output() {
        format!("{}\n\nTRANSCRIPT:\n{}", header, transcript.text)
    } else {
        format!("{}\n\n{}", header, context.text_for_prompt())
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
