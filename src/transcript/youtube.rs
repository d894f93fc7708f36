//! YouTube captions via the `yt-transcript-rs` client.

use super::{CaptionEntry, CaptionSource};
use crate::error::{Result, TubesumError};
use async_trait::async_trait;
use tracing::debug;
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// Caption source that reads YouTube's published or auto-generated captions.
pub struct YoutubeCaptionSource {
    api: YouTubeTranscriptApi,
}

impl YoutubeCaptionSource {
    /// Create a client without cookies or proxy.
    pub fn new() -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| TubesumError::Config(format!("Failed to create captions client: {}", e)))?;
        Ok(Self { api })
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptionSource {
    async fn fetch_captions(&self, video_id: &str, languages: &[String]) -> Result<Vec<CaptionEntry>> {
        let languages: Vec<&str> = languages.iter().map(String::as_str).collect();

        let transcript = self
            .api
            .fetch_transcript(video_id, &languages, false)
            .await
            .map_err(|e| TubesumError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                cause: e.to_string(),
            })?;

        debug!(
            "Fetched {} caption entries ({}, generated: {})",
            transcript.snippets.len(),
            transcript.language_code,
            transcript.is_generated
        );

        Ok(transcript
            .snippets
            .into_iter()
            .map(|s| CaptionEntry::new(s.text, s.start, s.duration))
            .collect())
    }
}
