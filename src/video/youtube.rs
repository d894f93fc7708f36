//! YouTube identifier parsing and yt-dlp metadata lookup.

use super::{MetadataSource, VideoMetadata, VideoReference};
use crate::error::{Result, TubesumError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid regex"));

/// Path prefixes that carry the identifier as the next segment.
const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "shorts", "live", "e"];

/// Extract the canonical video ID from a YouTube URL or bare ID.
pub(super) fn extract_video_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let invalid = || TubesumError::InvalidReference(format!("not a YouTube video: {:?}", input));

    if trimmed.is_empty() {
        return Err(invalid());
    }

    if VIDEO_ID.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?.to_ascii_lowercase();
    let host = ["www.", "m.", "music."]
        .iter()
        .fold(host.as_str(), |h, prefix| h.strip_prefix(prefix).unwrap_or(h))
        .to_string();

    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let id = match host.as_str() {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some(prefix) if ID_PATH_PREFIXES.contains(&prefix) => {
                segments.next().map(str::to_string)
            }
            _ => None,
        },
        _ => None,
    };

    match id {
        Some(id) if VIDEO_ID.is_match(&id) => Ok(id),
        _ => Err(invalid()),
    }
}

/// Metadata source backed by `yt-dlp --dump-json`.
#[derive(Debug, Default)]
pub struct YtDlpMetadataSource;

impl YtDlpMetadataSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataSource for YtDlpMetadataSource {
    async fn fetch_metadata(&self, video: &VideoReference) -> Result<VideoMetadata> {
        let url = video.watch_url();

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                "--no-playlist",
                &url,
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TubesumError::ToolNotFound("yt-dlp".to_string())
                } else {
                    TubesumError::Metadata(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TubesumError::Metadata(format!(
                "yt-dlp could not read {}: {}",
                video.video_id,
                stderr.trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| TubesumError::Metadata(format!("Failed to parse yt-dlp output: {}", e)))?;

        debug!("yt-dlp returned metadata for {}", video.video_id);
        Ok(metadata_from_ytdlp_json(video, &json))
    }
}

/// Build metadata from a yt-dlp JSON document, falling back field by field.
pub fn metadata_from_ytdlp_json(video: &VideoReference, json: &serde_json::Value) -> VideoMetadata {
    let fallback = VideoMetadata::placeholder(video);

    let title = json["title"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .unwrap_or(fallback.title);

    let channel = json["channel"]
        .as_str()
        .or_else(|| json["uploader"].as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .unwrap_or(fallback.channel);

    VideoMetadata {
        video_id: video.video_id.clone(),
        title,
        channel,
        url: fallback.url,
        duration_seconds: json["duration"].as_f64().map(|d| d as u32),
    }
}
