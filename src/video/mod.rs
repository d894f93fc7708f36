//! Video references and metadata.
//!
//! Turns free-form user input into a canonical YouTube identifier and looks up
//! the title and channel shown in the outputs.

mod youtube;

pub use youtube::{metadata_from_ytdlp_json, YtDlpMetadataSource};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A video reference parsed from user input. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    /// The string the user typed.
    pub raw_input: String,
    /// Canonical 11-character identifier.
    pub video_id: String,
}

impl VideoReference {
    /// Parse a URL in any common YouTube form, or a bare identifier.
    pub fn parse(input: &str) -> Result<Self> {
        let video_id = youtube::extract_video_id(input)?;
        Ok(Self {
            raw_input: input.to_string(),
            video_id,
        })
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.video_id)
    }
}

/// Metadata about a video, used for prompts and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Canonical identifier.
    pub video_id: String,
    /// Title.
    pub title: String,
    /// Channel or uploader name.
    pub channel: String,
    /// Watch URL.
    pub url: String,
    /// Duration in seconds (if known).
    pub duration_seconds: Option<u32>,
}

impl VideoMetadata {
    /// Stand-in used when the metadata lookup fails.
    pub fn placeholder(video: &VideoReference) -> Self {
        Self {
            video_id: video.video_id.clone(),
            title: format!("Video {}", video.video_id),
            channel: "Unknown Channel".to_string(),
            url: video.watch_url(),
            duration_seconds: None,
        }
    }

    /// Duration as MM:SS or HH:MM:SS, if known.
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration_seconds.map(|total| {
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let secs = total % 60;
            if hours > 0 {
                format!("{:02}:{:02}:{:02}", hours, minutes, secs)
            } else {
                format!("{:02}:{:02}", minutes, secs)
            }
        })
    }
}

/// Trait for video metadata providers.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch title, channel and duration for a video.
    async fn fetch_metadata(&self, video: &VideoReference) -> Result<VideoMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_forms_resolve_to_same_id() {
        let inputs = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abcdef",
            "youtu.be/dQw4w9WgXcQ",
            "www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?feature=shared",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
            "  dQw4w9WgXcQ\n",
        ];

        for input in inputs {
            let reference = VideoReference::parse(input)
                .unwrap_or_else(|e| panic!("{} should parse: {}", input, e));
            assert_eq!(reference.video_id, "dQw4w9WgXcQ", "input: {}", input);
            assert_eq!(reference.raw_input, input);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        for input in [
            "",
            "   ",
            "not-a-video-id",
            "https://vimeo.com/123456789",
            "https://www.youtube.com/watch?list=PL123",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/@somechannel",
        ] {
            let err = VideoReference::parse(input).unwrap_err();
            assert!(
                matches!(err, crate::error::TubesumError::InvalidReference(_)),
                "input: {:?}",
                input
            );
        }
    }

    #[test]
    fn test_watch_url() {
        let reference = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(
            reference.watch_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_placeholder_metadata() {
        let reference = VideoReference::parse("dQw4w9WgXcQ").unwrap();
        let meta = VideoMetadata::placeholder(&reference);
        assert_eq!(meta.title, "Video dQw4w9WgXcQ");
        assert_eq!(meta.channel, "Unknown Channel");
        assert_eq!(meta.formatted_duration(), None);
    }

    #[test]
    fn test_formatted_duration() {
        let reference = VideoReference::parse("dQw4w9WgXcQ").unwrap();
        let mut meta = VideoMetadata::placeholder(&reference);
        meta.duration_seconds = Some(212);
        assert_eq!(meta.formatted_duration().as_deref(), Some("03:32"));
        meta.duration_seconds = Some(3665);
        assert_eq!(meta.formatted_duration().as_deref(), Some("01:01:05"));
    }
}
