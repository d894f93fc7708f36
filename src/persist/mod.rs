//! Result persistence: one JSON record and one Markdown rendering per run.

mod markdown;

pub use markdown::render_markdown;

use crate::error::Result;
use crate::extract::StructuredSummary;
use crate::stages::StageOutput;
use crate::video::VideoMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Whether a run produced everything it was asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Complete,
    Degraded { reasons: Vec<String> },
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete)
    }
}

/// Everything persisted about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub video: VideoMetadata,
    /// Characters of transcript handed to the model.
    pub transcript_chars: usize,
    pub transcript_truncated: bool,
    pub model: String,
    /// Per-stage status and raw text.
    pub stages: Vec<StageOutput>,
    pub summary: StructuredSummary,
    pub outcome: RunOutcome,
}

impl OutputRecord {
    /// Timestamp used in file names.
    pub fn file_timestamp(&self) -> String {
        self.created_at.format("%Y%m%d_%H%M%S").to_string()
    }
}

/// Paths written by [`Persister::save`].
#[derive(Debug, Clone)]
pub struct SavedPaths {
    pub json: PathBuf,
    pub markdown: PathBuf,
    /// Raw stage texts, when enabled.
    pub stage_files: Vec<PathBuf>,
}

/// Writes run records to an output directory.
pub struct Persister {
    dir: PathBuf,
    save_stage_outputs: bool,
}

impl Persister {
    pub fn new(dir: impl Into<PathBuf>, save_stage_outputs: bool) -> Self {
        Self {
            dir: dir.into(),
            save_stage_outputs,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `summary_<id>_<timestamp>.json` and `.md`, creating the directory if needed.
    pub fn save(&self, record: &OutputRecord) -> Result<SavedPaths> {
        std::fs::create_dir_all(&self.dir)?;

        let stem = format!("summary_{}_{}", record.video.video_id, record.file_timestamp());
        let json = self.dir.join(format!("{}.json", stem));
        let markdown = self.dir.join(format!("{}.md", stem));

        std::fs::write(&json, serde_json::to_string_pretty(record)?)?;
        std::fs::write(&markdown, render_markdown(record))?;
        debug!("Wrote {} and {}", json.display(), markdown.display());

        let mut stage_files = Vec::new();
        if self.save_stage_outputs {
            for stage in record.stages.iter().filter(|s| s.is_completed()) {
                let path = self.dir.join(format!(
                    "{}_{}_{}.md",
                    stage.stage,
                    record.video.video_id,
                    record.file_timestamp()
                ));
                std::fs::write(&path, &stage.text)?;
                stage_files.push(path);
            }
        }

        info!("Saved summary to {}", self.dir.display());

        Ok(SavedPaths {
            json,
            markdown,
            stage_files,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::stages::StageKind;
    use chrono::TimeZone;
    use tempfile::TempDir;

    pub(crate) fn sample_record() -> OutputRecord {
        OutputRecord {
            run_id: Uuid::nil(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap(),
            video: VideoMetadata {
                video_id: "dQw4w9WgXcQ".to_string(),
                title: "Topic A Explained".to_string(),
                channel: "Example Channel".to_string(),
                url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                duration_seconds: Some(212),
            },
            transcript_chars: 40,
            transcript_truncated: false,
            model: "llama3.2:latest".to_string(),
            stages: vec![
                StageOutput::completed(StageKind::Analysis, "analysis text".into(), 1, 10),
                StageOutput::completed(StageKind::Writing, "writing text".into(), 1, 10),
                StageOutput::failed(StageKind::Critique, "timed out".into(), 2, 30),
            ],
            summary: StructuredSummary {
                executive_summary: "Topic A is important.".to_string(),
                key_takeaways: vec!["Topic A is important.".to_string(), "Topic A enables X.".to_string()],
                relevance_score: 8.0,
                ..StructuredSummary::default()
            },
            outcome: RunOutcome::Degraded {
                reasons: vec!["critique stage failed: timed out".to_string()],
            },
        }
    }

    #[test]
    fn test_save_writes_json_and_markdown() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("nested").join("outputs");
        let persister = Persister::new(&out_dir, false);

        let record = sample_record();
        let paths = persister.save(&record).unwrap();

        assert_eq!(
            paths.json.file_name().unwrap().to_str().unwrap(),
            "summary_dQw4w9WgXcQ_20240501_123045.json"
        );
        assert_eq!(
            paths.markdown.file_name().unwrap().to_str().unwrap(),
            "summary_dQw4w9WgXcQ_20240501_123045.md"
        );
        assert!(paths.stage_files.is_empty());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(json["video"]["title"], "Topic A Explained");
        assert_eq!(json["summary"]["executive_summary"], "Topic A is important.");
        assert_eq!(json["outcome"]["status"], "degraded");
        assert_eq!(json["stages"][2]["status"], "failed");

        let markdown = std::fs::read_to_string(&paths.markdown).unwrap();
        assert!(markdown.contains("# Topic A Explained"));
    }

    #[test]
    fn test_record_round_trips() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: OutputRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary, record.summary);
        assert_eq!(back.outcome, record.outcome);
        assert_eq!(back.created_at, record.created_at);
    }

    #[test]
    fn test_stage_outputs_written_when_enabled() {
        let dir = TempDir::new().unwrap();
        let persister = Persister::new(dir.path(), true);

        let paths = persister.save(&sample_record()).unwrap();

        let names: Vec<String> = paths
            .stage_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "analysis_dQw4w9WgXcQ_20240501_123045.md",
                "writing_dQw4w9WgXcQ_20240501_123045.md",
            ]
        );
        assert_eq!(std::fs::read_to_string(&paths.stage_files[0]).unwrap(), "analysis text");
    }
}
