//! Pipeline orchestrator for tubesum.
//!
//! Resolves the video, fetches its transcript, runs the three stages, extracts
//! the structured summary and persists the result. Only resolution and
//! transcript errors abort a run; everything after always yields saved files.

use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::extract::{Extractor, StructuredSummary};
use crate::generation::{Generator, OpenAIGenerator};
use crate::persist::{OutputRecord, Persister, SavedPaths};
use crate::stages::{StageContext, StageRunner, StageStatus};
use crate::transcript::{CaptionSource, TranscriptFetcher, YoutubeCaptionSource};
use crate::video::{MetadataSource, VideoMetadata, VideoReference, YtDlpMetadataSource};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub use crate::persist::RunOutcome;

/// Upper bound on the metadata lookup.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// The main orchestrator for the summarization pipeline.
pub struct Orchestrator {
    metadata: Arc<dyn MetadataSource>,
    fetcher: TranscriptFetcher,
    runner: StageRunner,
    extractor: Extractor,
    persister: Persister,
    model: String,
    metadata_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator backed by YouTube, yt-dlp and the configured endpoint.
    pub fn new(settings: Settings) -> Result<Self> {
        let metadata: Arc<dyn MetadataSource> = Arc::new(YtDlpMetadataSource::new());
        let captions: Arc<dyn CaptionSource> = Arc::new(YoutubeCaptionSource::new()?);
        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::new(&settings.generation)?);

        info!(
            "Using model {} at {}",
            settings.generation.model, settings.generation.base_url
        );

        Self::with_components(settings, metadata, captions, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        metadata: Arc<dyn MetadataSource>,
        captions: Arc<dyn CaptionSource>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let model = generator.model().to_string();
        let metadata_timeout = METADATA_TIMEOUT.min(settings.generation.call_timeout());
        let runner = StageRunner::new(generator, prompts, &settings);
        let fetcher = TranscriptFetcher::new(captions, settings.transcript.clone());
        let persister = Persister::new(settings.output_dir(), settings.output.save_stage_outputs);

        Ok(Self {
            metadata,
            fetcher,
            runner,
            extractor: Extractor::new(),
            persister,
            model,
            metadata_timeout,
        })
    }

    /// Override the per-call and whole-run generation timeouts.
    ///
    /// The metadata lookup is bounded by the per-call timeout too.
    pub fn with_timeouts(mut self, call_timeout: Duration, run_timeout: Duration) -> Self {
        self.runner = self.runner.with_timeouts(call_timeout, run_timeout);
        self.metadata_timeout = METADATA_TIMEOUT.min(call_timeout);
        self
    }

    /// Summarize one video.
    #[instrument(skip(self))]
    pub async fn summarize(&self, input: &str) -> Result<RunReport> {
        let video = VideoReference::parse(input)?;
        info!("Resolved video {}", video.video_id);

        let lookup = tokio::time::timeout(self.metadata_timeout, self.metadata.fetch_metadata(&video));
        let metadata = match lookup.await {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(e)) => {
                warn!("Metadata lookup failed, using placeholder: {}", e);
                VideoMetadata::placeholder(&video)
            }
            Err(_) => {
                warn!(
                    "Metadata lookup timed out after {:?}, using placeholder",
                    self.metadata_timeout
                );
                VideoMetadata::placeholder(&video)
            }
        };

        let transcript = self.fetcher.fetch(&video).await?;

        let context = self.runner.run(&transcript, &metadata).await;
        let summary = self.extractor.extract(&context);
        let outcome = assess(&context, &summary);

        if let RunOutcome::Degraded { reasons } = &outcome {
            warn!("Run degraded: {}", reasons.join("; "));
        }

        let record = OutputRecord {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            video: metadata,
            transcript_chars: transcript.text.chars().count(),
            transcript_truncated: transcript.truncated,
            model: self.model.clone(),
            stages: context.outputs().to_vec(),
            summary,
            outcome,
        };

        let paths = self.persister.save(&record)?;

        Ok(RunReport { record, paths })
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub record: OutputRecord,
    pub paths: SavedPaths,
}

impl RunReport {
    pub fn outcome(&self) -> &RunOutcome {
        &self.record.outcome
    }

    pub fn summary(&self) -> &StructuredSummary {
        &self.record.summary
    }
}

/// Collect the reasons a run fell short, if any.
fn assess(context: &StageContext, summary: &StructuredSummary) -> RunOutcome {
    let mut reasons: Vec<String> = context
        .outputs()
        .iter()
        .filter_map(|output| match &output.status {
            StageStatus::Completed => None,
            StageStatus::Failed { error } => Some(format!("{} stage failed: {}", output.stage, error)),
            StageStatus::Skipped { reason } => Some(format!("{} stage skipped: {}", output.stage, reason)),
        })
        .collect();

    if !summary.low_confidence.is_empty() {
        let fields: Vec<String> = summary.low_confidence.iter().map(|f| f.to_string()).collect();
        reasons.push(format!("low-confidence fields: {}", fields.join(", ")));
    }

    if reasons.is_empty() {
        RunOutcome::Complete
    } else {
        RunOutcome::Degraded { reasons }
    }
}
