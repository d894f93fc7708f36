//! Output extraction: turn raw stage text into a [`StructuredSummary`].
//!
//! Extraction never fails. Fields that cannot be recovered take a default value
//! and are listed in [`StructuredSummary::low_confidence`].

mod sections;

pub use sections::{
    extract_fields, extract_sections, is_heading_line, parse_approval, parse_list, parse_score,
    PartialSummary, Sections, MAX_LIST_ITEMS,
};

use crate::stages::{StageContext, StageKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum sentence length when deriving takeaways from a detailed summary.
const MIN_DERIVED_TAKEAWAY_CHARS: usize = 20;

/// Number of takeaways derived from a detailed summary.
const MAX_DERIVED_TAKEAWAYS: usize = 5;

/// Named fields of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryField {
    ExecutiveSummary,
    DetailedSummary,
    KeyTakeaways,
    KeyTopics,
    ImportantQuotes,
    TargetAudience,
    ContentCategory,
    RelevanceScore,
    CompletenessScore,
    AccuracyAssessment,
    ImprovementSuggestions,
    FinalVerdict,
    Approved,
}

impl std::fmt::Display for SummaryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SummaryField::ExecutiveSummary => "executive summary",
            SummaryField::DetailedSummary => "detailed summary",
            SummaryField::KeyTakeaways => "key takeaways",
            SummaryField::KeyTopics => "key topics",
            SummaryField::ImportantQuotes => "important quotes",
            SummaryField::TargetAudience => "target audience",
            SummaryField::ContentCategory => "content category",
            SummaryField::RelevanceScore => "relevance score",
            SummaryField::CompletenessScore => "completeness score",
            SummaryField::AccuracyAssessment => "accuracy assessment",
            SummaryField::ImprovementSuggestions => "improvement suggestions",
            SummaryField::FinalVerdict => "final verdict",
            SummaryField::Approved => "approved",
        };
        write!(f, "{}", name)
    }
}

/// The structured result of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredSummary {
    pub executive_summary: String,
    pub detailed_summary: String,
    pub key_takeaways: Vec<String>,
    pub key_topics: Vec<String>,
    pub important_quotes: Vec<String>,
    pub target_audience: String,
    pub content_category: String,
    /// In `[0, 10]`.
    pub relevance_score: f64,
    /// In `[0, 10]`.
    pub completeness_score: f64,
    pub accuracy_assessment: String,
    pub improvement_suggestions: Vec<String>,
    pub final_verdict: String,
    pub approved: bool,
    /// Fields that were defaulted or recovered heuristically.
    pub low_confidence: Vec<SummaryField>,
}

impl StructuredSummary {
    pub fn is_low_confidence(&self, field: SummaryField) -> bool {
        self.low_confidence.contains(&field)
    }

    /// Whether every core field came from a labeled section.
    pub fn is_complete(&self) -> bool {
        self.low_confidence.is_empty()
    }
}

/// Merges per-stage fields into a [`StructuredSummary`].
///
/// Content fields are taken from the first stage that labels them, in the order
/// Critique, Writing, Analysis. Scores, approval, accuracy, suggestions and the
/// verdict come from Critique only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, context: &StageContext) -> StructuredSummary {
        let critique = stage_fields(context, StageKind::Critique);
        let writing = stage_fields(context, StageKind::Writing);
        let analysis = stage_fields(context, StageKind::Analysis);
        let by_precedence = [&critique, &writing, &analysis];

        let mut low_confidence = Vec::new();

        let detailed_summary = first(&by_precedence, |p| p.detailed_summary.clone()).unwrap_or_default();

        let executive_summary = match first(&by_precedence, |p| p.executive_summary.clone()) {
            Some(summary) => summary,
            None => {
                low_confidence.push(SummaryField::ExecutiveSummary);
                leading_paragraph(context).unwrap_or_default()
            }
        };

        let key_takeaways = match first(&by_precedence, |p| p.key_takeaways.clone()) {
            Some(items) => items,
            None => {
                low_confidence.push(SummaryField::KeyTakeaways);
                derive_takeaways(&detailed_summary)
            }
        };

        let relevance_score = critique.relevance_score.unwrap_or_else(|| {
            low_confidence.push(SummaryField::RelevanceScore);
            0.0
        });

        let completeness_score = critique.completeness_score.unwrap_or_else(|| {
            low_confidence.push(SummaryField::CompletenessScore);
            0.0
        });

        let final_verdict = critique.final_verdict.clone().unwrap_or_default();

        let approved = match critique.approved {
            Some(approved) => approved,
            None => {
                low_confidence.push(SummaryField::Approved);
                parse_approval(&final_verdict).unwrap_or(false)
            }
        };

        if !low_confidence.is_empty() {
            debug!("Low-confidence fields: {:?}", low_confidence);
        }

        StructuredSummary {
            executive_summary,
            detailed_summary,
            key_takeaways,
            key_topics: first(&by_precedence, |p| p.key_topics.clone()).unwrap_or_default(),
            important_quotes: first(&by_precedence, |p| p.important_quotes.clone()).unwrap_or_default(),
            target_audience: first(&by_precedence, |p| p.target_audience.clone()).unwrap_or_default(),
            content_category: first(&by_precedence, |p| p.content_category.clone()).unwrap_or_default(),
            relevance_score,
            completeness_score,
            accuracy_assessment: critique.accuracy_assessment.clone().unwrap_or_default(),
            improvement_suggestions: critique.improvement_suggestions.clone().unwrap_or_default(),
            final_verdict,
            approved,
            low_confidence,
        }
    }
}

fn stage_fields(context: &StageContext, stage: StageKind) -> PartialSummary {
    extract_fields(context.text(stage))
}

fn first<T>(partials: &[&PartialSummary], pick: impl Fn(&PartialSummary) -> Option<T>) -> Option<T> {
    partials.iter().find_map(|p| pick(*p))
}

/// First paragraph that is neither a heading nor a list, from Writing, Critique, then Analysis.
fn leading_paragraph(context: &StageContext) -> Option<String> {
    [StageKind::Writing, StageKind::Critique, StageKind::Analysis]
        .into_iter()
        .find_map(|stage| {
            context
                .text(stage)
                .split("\n\n")
                .map(str::trim)
                .find(|para| {
                    let first_line = para.lines().next().unwrap_or("");
                    !para.is_empty()
                        && !is_heading_line(first_line)
                        && parse_list(first_line).is_empty()
                        && !first_line.trim_start().starts_with('#')
                })
                .map(|para| para.lines().map(str::trim).collect::<Vec<_>>().join(" "))
        })
}

/// Sentences of a detailed summary long enough to stand on their own.
fn derive_takeaways(detailed_summary: &str) -> Vec<String> {
    detailed_summary
        .split(['.', '!', '?'])
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| s.len() > MIN_DERIVED_TAKEAWAY_CHARS)
        .take(MAX_DERIVED_TAKEAWAYS)
        .map(|s| format!("{}.", s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::StageOutput;

    fn context(analysis: &str, writing: &str, critique: &str) -> StageContext {
        let mut context = StageContext::new();
        context.push(StageOutput::completed(StageKind::Analysis, analysis.into(), 1, 0));
        context.push(StageOutput::completed(StageKind::Writing, writing.into(), 1, 0));
        context.push(StageOutput::completed(StageKind::Critique, critique.into(), 1, 0));
        context
    }

    #[test]
    fn test_complete_critique() {
        let critique = "\
Executive Summary: Topic A is important and enables X.

Key Takeaways:
- Topic A is important.
- Topic A enables X.

Relevance Score: 9/10
Completeness Score: 8
Final Verdict: Accurate and concise.
Approved: Yes";
        let summary = Extractor::new().extract(&context("", "", critique));

        assert_eq!(summary.executive_summary, "Topic A is important and enables X.");
        assert_eq!(summary.key_takeaways, vec!["Topic A is important.", "Topic A enables X."]);
        assert_eq!(summary.relevance_score, 9.0);
        assert_eq!(summary.completeness_score, 8.0);
        assert!(summary.approved);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_fields_fall_back_to_writing_then_analysis() {
        let analysis = "Key Topics:\n- Topic A\n- X\nTarget Audience: Beginners";
        let writing = "Executive Summary: From the writer.\nKey Takeaways:\n- Writer point";
        let critique = "Relevance Score: 7\nCompleteness Score: 6\nApproved: No";

        let summary = Extractor::new().extract(&context(analysis, writing, critique));

        assert_eq!(summary.executive_summary, "From the writer.");
        assert_eq!(summary.key_takeaways, vec!["Writer point"]);
        assert_eq!(summary.key_topics, vec!["Topic A", "X"]);
        assert_eq!(summary.target_audience, "Beginners");
        assert!(!summary.approved);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_scores_only_from_critique() {
        let writing = "Executive Summary: Text.\nRelevance Score: 9";
        let summary = Extractor::new().extract(&context("", writing, ""));
        assert_eq!(summary.relevance_score, 0.0);
        assert!(summary.is_low_confidence(SummaryField::RelevanceScore));
    }

    #[test]
    fn test_unparsable_score_defaults_low_confidence() {
        let critique = "Executive Summary: Text.\nKey Takeaways:\n- One\nRelevance Score: N/A\nCompleteness Score: 15/10\nApproved: Yes";
        let summary = Extractor::new().extract(&context("", "", critique));

        assert_eq!(summary.relevance_score, 0.0);
        assert!(summary.is_low_confidence(SummaryField::RelevanceScore));
        assert_eq!(summary.completeness_score, 10.0);
        assert!(!summary.is_low_confidence(SummaryField::CompletenessScore));
    }

    #[test]
    fn test_all_stages_empty_yields_defaults() {
        let mut context = StageContext::new();
        for stage in StageKind::ALL {
            context.push(StageOutput::failed(stage, "timeout".into(), 2, 0));
        }

        let summary = Extractor::new().extract(&context);
        assert_eq!(summary.executive_summary, "");
        assert!(summary.key_takeaways.is_empty());
        assert_eq!(summary.relevance_score, 0.0);
        assert!(!summary.approved);
        assert_eq!(
            summary.low_confidence,
            vec![
                SummaryField::ExecutiveSummary,
                SummaryField::KeyTakeaways,
                SummaryField::RelevanceScore,
                SummaryField::CompletenessScore,
                SummaryField::Approved,
            ]
        );
    }

    #[test]
    fn test_unlabeled_writing_uses_leading_paragraph() {
        let writing = "# Summary\n\nThe video walks through Topic A\nand how it enables X.\n\nMore detail follows.";
        let summary = Extractor::new().extract(&context("", writing, ""));

        assert_eq!(summary.executive_summary, "The video walks through Topic A and how it enables X.");
        assert!(summary.is_low_confidence(SummaryField::ExecutiveSummary));
    }

    #[test]
    fn test_takeaways_derived_from_detailed_summary() {
        let writing = "Executive Summary: Short.\n\nDetailed Summary:\nTopic A is the central idea here. It is short. Topic A enables X in practice!";
        let summary = Extractor::new().extract(&context("", writing, ""));

        assert_eq!(
            summary.key_takeaways,
            vec!["Topic A is the central idea here.", "Topic A enables X in practice."]
        );
        assert!(summary.is_low_confidence(SummaryField::KeyTakeaways));
    }

    #[test]
    fn test_approval_falls_back_to_verdict() {
        let critique = "Final Verdict: Approved with minor edits.";
        let summary = Extractor::new().extract(&context("", "", critique));
        assert!(summary.approved);
        assert!(summary.is_low_confidence(SummaryField::Approved));
    }
}
