//! Markdown rendering of a run record.

use super::{OutputRecord, RunOutcome};
use crate::stages::StageStatus;

/// Render a run record as a Markdown document.
pub fn render_markdown(record: &OutputRecord) -> String {
    let summary = &record.summary;
    let video = &record.video;
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# {}", video.title));
    lines.push(String::new());
    lines.push("## Video Information".to_string());
    lines.push(format!("- **URL**: {}", video.url));
    lines.push(format!("- **Channel**: {}", video.channel));
    lines.push(format!(
        "- **Duration**: {}",
        video.formatted_duration().unwrap_or_else(|| "Unknown".to_string())
    ));
    if !summary.content_category.is_empty() {
        lines.push(format!("- **Content Category**: {}", summary.content_category));
    }
    if !summary.target_audience.is_empty() {
        lines.push(format!("- **Target Audience**: {}", summary.target_audience));
    }
    lines.push(format!("- **Model**: {}", record.model));
    lines.push(format!("- **Generated**: {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC")));

    lines.push(String::new());
    lines.push("## Executive Summary".to_string());
    lines.push(or_placeholder(&summary.executive_summary));

    if !summary.detailed_summary.is_empty() {
        lines.push(String::new());
        lines.push("## Detailed Summary".to_string());
        lines.push(summary.detailed_summary.clone());
    }

    lines.push(String::new());
    lines.push("## Key Takeaways".to_string());
    if summary.key_takeaways.is_empty() {
        lines.push(or_placeholder(""));
    }
    for (i, takeaway) in summary.key_takeaways.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, takeaway));
    }

    if !summary.key_topics.is_empty() {
        lines.push(String::new());
        lines.push("## Main Topics".to_string());
        lines.extend(summary.key_topics.iter().map(|t| format!("- {}", t)));
    }

    if !summary.important_quotes.is_empty() {
        lines.push(String::new());
        lines.push("## Notable Quotes".to_string());
        for quote in &summary.important_quotes {
            lines.push(format!("> {}", quote));
            lines.push(String::new());
        }
        lines.pop();
    }

    lines.push(String::new());
    lines.push("## Quality Assessment".to_string());
    lines.push(format!("- **Relevance Score**: {}/10", summary.relevance_score));
    lines.push(format!("- **Completeness Score**: {}/10", summary.completeness_score));
    lines.push(format!(
        "- **Status**: {}",
        if summary.approved { "Approved" } else { "Needs Improvement" }
    ));
    if !summary.accuracy_assessment.is_empty() {
        lines.push(format!("- **Accuracy**: {}", summary.accuracy_assessment));
    }
    if !summary.final_verdict.is_empty() {
        lines.push(format!("- **Verdict**: {}", summary.final_verdict));
    }

    if !summary.improvement_suggestions.is_empty() {
        lines.push(String::new());
        lines.push("## Improvement Suggestions".to_string());
        lines.extend(summary.improvement_suggestions.iter().map(|s| format!("- {}", s)));
    }

    if let RunOutcome::Degraded { reasons } = &record.outcome {
        lines.push(String::new());
        lines.push("## Run Notes".to_string());
        lines.push("This summary is degraded:".to_string());
        lines.extend(reasons.iter().map(|r| format!("- {}", r)));
    }

    lines.push(String::new());
    lines.push("## Stages".to_string());
    for stage in &record.stages {
        let status = match &stage.status {
            StageStatus::Completed => "completed".to_string(),
            StageStatus::Failed { error } => format!("failed ({})", error),
            StageStatus::Skipped { reason } => format!("skipped ({})", reason),
        };
        lines.push(format!(
            "- {}: {} in {} attempt(s), {} ms",
            stage.stage.label(),
            status,
            stage.attempts,
            stage.elapsed_ms
        ));
    }

    lines.push(String::new());
    lines.join("\n")
}

fn or_placeholder(text: &str) -> String {
    if text.trim().is_empty() {
        "_Not available._".to_string()
    } else {
        text.to_string()
    }
}
