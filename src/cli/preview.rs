//! Console preview of a finished run.

use super::Output;
use crate::persist::OutputRecord;

/// Characters of the executive summary shown in the preview.
const SUMMARY_PREVIEW_CHARS: usize = 600;

/// Print the executive summary, takeaways, scores, approval and audience.
pub fn print_preview(record: &OutputRecord) {
    let summary = &record.summary;

    Output::header(&record.video.title);
    Output::kv("Channel", &record.video.channel);
    if let Some(duration) = record.video.formatted_duration() {
        Output::kv("Duration", &duration);
    }

    Output::header("Executive Summary");
    if summary.executive_summary.is_empty() {
        println!("  (not available)");
    } else {
        println!("  {}", content_preview(&summary.executive_summary, SUMMARY_PREVIEW_CHARS));
    }

    if !summary.key_takeaways.is_empty() {
        Output::header("Key Takeaways");
        for (i, takeaway) in summary.key_takeaways.iter().enumerate() {
            Output::numbered_item(i + 1, takeaway);
        }
    }

    Output::header("Quality");
    Output::kv("Relevance", &format!("{}/10", summary.relevance_score));
    Output::kv("Completeness", &format!("{}/10", summary.completeness_score));
    Output::kv(
        "Status",
        if summary.approved { "Approved" } else { "Needs improvement" },
    );
    if !summary.target_audience.is_empty() {
        Output::kv("Audience", &summary.target_audience);
    }
    println!();
}

/// Collapse newlines and cut to `max_chars` characters with an ellipsis.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}
