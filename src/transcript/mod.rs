//! Transcript retrieval.
//!
//! A [`CaptionSource`] is the external captions service; [`TranscriptFetcher`]
//! turns its time-ordered entries into the single text block fed to the stages.

mod youtube;

pub use youtube::YoutubeCaptionSource;

use crate::config::TranscriptSettings;
use crate::error::{Result, TubesumError};
use crate::video::VideoReference;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One caption entry as returned by the captions service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionEntry {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Display duration in seconds.
    pub duration_seconds: f64,
}

impl CaptionEntry {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// Trait for caption providers.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch caption entries in time order, trying languages in priority order.
    async fn fetch_captions(&self, video_id: &str, languages: &[String]) -> Result<Vec<CaptionEntry>>;
}

/// Concatenated caption text for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptText {
    /// Video this transcript belongs to.
    pub video_id: String,
    /// Caption text joined with single spaces.
    pub text: String,
    /// Number of non-empty caption entries used.
    pub entry_count: usize,
    /// Whether the text was cut to the configured ceiling.
    pub truncated: bool,
}

impl TranscriptText {
    /// First `max_chars` characters, for prompt excerpts.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let (cut, truncated) = truncate_chars(&self.text, max_chars);
        if truncated {
            format!("{}...", cut)
        } else {
            cut.to_string()
        }
    }
}

/// Fetches captions and joins them into a [`TranscriptText`].
pub struct TranscriptFetcher {
    source: Arc<dyn CaptionSource>,
    settings: TranscriptSettings,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn CaptionSource>, settings: TranscriptSettings) -> Self {
        Self { source, settings }
    }

    /// Fetch the transcript for a video. Any failure is fatal for the run.
    #[instrument(skip(self), fields(video_id = %video.video_id))]
    pub async fn fetch(&self, video: &VideoReference) -> Result<TranscriptText> {
        let entries = self
            .source
            .fetch_captions(&video.video_id, &self.settings.languages)
            .await
            .map_err(|e| match e {
                TubesumError::TranscriptUnavailable { .. } => e,
                other => TubesumError::TranscriptUnavailable {
                    video_id: video.video_id.clone(),
                    cause: other.to_string(),
                },
            })?;

        let (text, entry_count) = join_captions(&entries);

        if text.is_empty() {
            return Err(TubesumError::TranscriptUnavailable {
                video_id: video.video_id.clone(),
                cause: "captions service returned no text".to_string(),
            });
        }

        let (text, truncated) = match self.settings.max_chars {
            Some(max) => {
                let (cut, truncated) = truncate_chars(&text, max);
                if truncated {
                    warn!("Transcript cut from {} to {} characters", text.chars().count(), max);
                }
                (cut.to_string(), truncated)
            }
            None => (text, false),
        };

        info!("Transcript ready: {} entries, {} characters", entry_count, text.len());

        Ok(TranscriptText {
            video_id: video.video_id.clone(),
            text,
            entry_count,
            truncated,
        })
    }
}

/// Join caption entries in order, trimming each and dropping empty ones.
///
/// Returns the joined text and the number of entries that contributed to it.
pub fn join_captions(entries: &[CaptionEntry]) -> (String, usize) {
    let parts: Vec<String> = entries
        .iter()
        .map(|e| e.text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect();

    let count = parts.len();
    (parts.join(" "), count)
}

/// Cut text to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}
