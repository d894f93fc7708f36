//! The three-stage generation pipeline.
//!
//! Stages run strictly in order (`Analysis -> Writing -> Critique`); each one sees
//! the text produced by the stages before it. Outputs accumulate in an
//! append-only [`StageContext`].

mod runner;

pub use runner::StageRunner;

use serde::{Deserialize, Serialize};

/// Kind of stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Analysis,
    Writing,
    Critique,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [StageKind; 3] = [StageKind::Analysis, StageKind::Writing, StageKind::Critique];

    /// The stage that runs after this one, or `None` after the last.
    pub fn next(self) -> Option<StageKind> {
        match self {
            StageKind::Analysis => Some(StageKind::Writing),
            StageKind::Writing => Some(StageKind::Critique),
            StageKind::Critique => None,
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Analysis => "Analysis",
            StageKind::Writing => "Writing",
            StageKind::Critique => "Critique",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Analysis => write!(f, "analysis"),
            StageKind::Writing => write!(f, "writing"),
            StageKind::Critique => write!(f, "critique"),
        }
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageStatus {
    /// The model returned text.
    Completed,
    /// Both attempts failed; the text is empty.
    Failed { error: String },
    /// Not attempted because the run deadline had passed.
    Skipped { reason: String },
}

/// Result of running one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutput {
    pub stage: StageKind,
    /// Raw generated text (empty unless completed).
    pub text: String,
    #[serde(flatten)]
    pub status: StageStatus,
    /// Number of generation calls made.
    pub attempts: u32,
    /// Wall-clock time spent in this stage.
    pub elapsed_ms: u64,
}

impl StageOutput {
    pub fn completed(stage: StageKind, text: String, attempts: u32, elapsed_ms: u64) -> Self {
        Self {
            stage,
            text,
            status: StageStatus::Completed,
            attempts,
            elapsed_ms,
        }
    }

    pub fn failed(stage: StageKind, error: String, attempts: u32, elapsed_ms: u64) -> Self {
        Self {
            stage,
            text: String::new(),
            status: StageStatus::Failed { error },
            attempts,
            elapsed_ms,
        }
    }

    pub fn skipped(stage: StageKind, reason: &str) -> Self {
        Self {
            stage,
            text: String::new(),
            status: StageStatus::Skipped {
                reason: reason.to_string(),
            },
            attempts: 0,
            elapsed_ms: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StageStatus::Completed
    }
}

/// Ordered, append-only record of stage outputs for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageContext {
    outputs: Vec<StageOutput>,
}

impl StageContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage output.
    pub fn push(&mut self, output: StageOutput) {
        self.outputs.push(output);
    }

    /// Output of a given stage, if it has run.
    pub fn get(&self, stage: StageKind) -> Option<&StageOutput> {
        self.outputs.iter().find(|o| o.stage == stage)
    }

    /// Text of a given stage; empty if it has not run or failed.
    pub fn text(&self, stage: StageKind) -> &str {
        self.get(stage).map(|o| o.text.as_str()).unwrap_or("")
    }

    /// The most recently appended output.
    pub fn last(&self) -> Option<&StageOutput> {
        self.outputs.last()
    }

    pub fn outputs(&self) -> &[StageOutput] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Whether at least one stage produced text.
    pub fn has_completed_output(&self) -> bool {
        self.outputs.iter().any(|o| o.is_completed() && !o.text.trim().is_empty())
    }

    /// Completed outputs formatted as prompt context for the next stage.
    pub fn text_for_prompt(&self) -> String {
        self.outputs
            .iter()
            .filter(|o| o.is_completed())
            .map(|o| format!("=== {} OUTPUT ===\n{}", o.stage.label().to_uppercase(), o.text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Stages that failed or were skipped.
    pub fn degraded_stages(&self) -> Vec<StageKind> {
        self.outputs
            .iter()
            .filter(|o| !o.is_completed())
            .map(|o| o.stage)
            .collect()
    }
}
