//! Labeled-section parsing of free-form model output.
//!
//! Everything here is a pure function of the input text.

use super::SummaryField;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Upper bound on items kept from one list section.
pub const MAX_LIST_ITEMS: usize = 10;

/// Recognised headings. `None` marks headings that only delimit other sections.
const HEADINGS: &[(&str, Option<SummaryField>)] = &[
    (
        r"(?:revised[ \t]+|final[ \t]+)?executive[ \t]+summary(?:[ \t]+overview)?",
        Some(SummaryField::ExecutiveSummary),
    ),
    (r"detailed[ \t]+summary", Some(SummaryField::DetailedSummary)),
    (
        r"(?:key|main|actionable)[ \t]+takeaways|takeaways",
        Some(SummaryField::KeyTakeaways),
    ),
    (
        r"key[ \t]+topics|main[ \t]+topics(?:[ \t]+discussed)?|core[ \t]+themes",
        Some(SummaryField::KeyTopics),
    ),
    (
        r"(?:important|notable|key)[ \t]+quotes",
        Some(SummaryField::ImportantQuotes),
    ),
    (r"target[ \t]+audience", Some(SummaryField::TargetAudience)),
    (r"content[ \t]+(?:category|type)", Some(SummaryField::ContentCategory)),
    (r"relevance(?:[ \t]+score)?", Some(SummaryField::RelevanceScore)),
    (r"completeness(?:[ \t]+score)?", Some(SummaryField::CompletenessScore)),
    (r"accuracy(?:[ \t]+assessment)?", Some(SummaryField::AccuracyAssessment)),
    (
        r"improvement[ \t]+(?:suggestions|areas)|suggestions[ \t]+for[ \t]+improvement",
        Some(SummaryField::ImprovementSuggestions),
    ),
    (r"final[ \t]+verdict|verdict", Some(SummaryField::FinalVerdict)),
    (r"approved|approval(?:[ \t]+status)?", Some(SummaryField::Approved)),
    (r"supporting[ \t]+evidence|evidence(?:[ \t]+and[ \t]+data)?", None),
    (r"context(?:[ \t]+and[ \t]+background(?:[ \t]+information)?)?", None),
    (r"quality(?:[ \t]+review)?", None),
];

/// A heading line: optional markdown `#`, bullet, number, and bold markers around
/// the label, an optional parenthetical like `(Score 0-10)`, then a colon or end of line.
///
/// See [`heading_field`] for the extra rule on bulleted lines.
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let labels = HEADINGS
        .iter()
        .map(|(pattern, _)| format!("(?:{})", pattern))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(
        r"(?im)^[ \t]*(?:#{{1,6}}[ \t]*)?(?P<marker>(?:[-*•][ \t]+)?(?:\d+[.)][ \t]*)?)(?P<bold>\*\*|__)?[ \t]*(?P<label>{})[ \t]*(?:\*\*|__)?[ \t]*(?P<note>\([^)\n]*\))?[ \t]*(?:\*\*|__)?[ \t]*(?::[ \t]*(?:\*\*|__)?|$)",
        labels
    ))
    .expect("Invalid heading regex")
});

/// One anchored regex per heading, used to classify a matched label.
static HEADING_CLASSIFIERS: LazyLock<Vec<(Regex, Option<SummaryField>)>> = LazyLock::new(|| {
    HEADINGS
        .iter()
        .map(|(pattern, field)| {
            let regex = Regex::new(&format!(r"(?i)^(?:{})$", pattern)).expect("Invalid heading regex");
            (regex, *field)
        })
        .collect()
});

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(?:[-*•+]|\d+[.)])[ \t]+(.*)$").expect("Invalid regex"));

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("Invalid regex"));

static APPROVE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:yes|true|approved?|accept(?:ed|able)?|pass(?:ed)?)\b").expect("Invalid regex")
});

static REJECT_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:no|not|false|rejected?|needs|fail(?:ed)?)\b").expect("Invalid regex")
});

static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(?:-{3,}|\*{3,}|_{3,}|={3,})[ \t]*$").expect("Invalid regex"));

/// Section bodies keyed by field. The first non-empty occurrence of a heading wins.
#[derive(Debug, Clone, Default)]
pub struct Sections {
    bodies: HashMap<SummaryField, String>,
}

impl Sections {
    pub fn get(&self, field: SummaryField) -> Option<&str> {
        self.bodies.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }
}

/// Split text into labeled sections.
pub fn extract_sections(text: &str) -> Sections {
    let text = text.replace("\r\n", "\n");
    let headings: Vec<(usize, usize, Option<SummaryField>)> = HEADING_LINE
        .captures_iter(&text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let field = heading_field(&caps, &text)?;
            Some((whole.start(), whole.end(), field))
        })
        .collect();

    let mut sections = Sections::default();

    for (i, (_, body_start, field)) in headings.iter().enumerate() {
        let Some(field) = field else { continue };
        let body_end = headings.get(i + 1).map(|h| h.0).unwrap_or(text.len());
        let body = clean_body(&text[*body_start..body_end]);

        if !body.is_empty() && !sections.bodies.contains_key(field) {
            sections.bodies.insert(*field, body);
        }
    }

    sections
}

/// Whether a line on its own reads as one of the recognised headings.
pub fn is_heading_line(line: &str) -> bool {
    HEADING_LINE
        .captures(line)
        .is_some_and(|caps| heading_field(&caps, line).is_some())
}

/// Classify a heading match.
///
/// A bulleted or numbered line with a bare one-word label (`- Context: ...`)
/// is a list item, not a heading, unless the label is bold, carries a
/// parenthetical, or nothing follows the colon.
fn heading_field(caps: &regex::Captures<'_>, text: &str) -> Option<Option<SummaryField>> {
    let whole = caps.get(0)?;
    let label = caps.name("label")?.as_str();
    let field = classify(label)?;

    let in_list = caps.name("marker").is_some_and(|m| !m.as_str().is_empty());
    if in_list && caps.name("bold").is_none() && caps.name("note").is_none() {
        let rest = text[whole.end()..].lines().next().unwrap_or("");
        let bare_label = !label.trim().contains(char::is_whitespace);
        if bare_label && !rest.trim().is_empty() {
            return None;
        }
    }

    Some(field)
}

fn classify(label: &str) -> Option<Option<SummaryField>> {
    let normalized = label.split_whitespace().collect::<Vec<_>>().join(" ");
    HEADING_CLASSIFIERS
        .iter()
        .find(|(regex, _)| regex.is_match(&normalized))
        .map(|(_, field)| *field)
}

/// Trim a section body and drop markdown rules.
fn clean_body(body: &str) -> String {
    body.lines()
        .filter(|line| !HORIZONTAL_RULE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Strip surrounding whitespace and markdown emphasis.
pub fn strip_emphasis(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .to_string()
}

/// Split a body on line-leading bullet or number markers.
///
/// Lines without a marker continue the previous item. Text before the first
/// marker is ignored; no markers at all yields an empty list.
pub fn parse_list(body: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();

    for line in body.lines() {
        if let Some(caps) = LIST_ITEM.captures(line) {
            let item = strip_emphasis(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
            if !item.is_empty() {
                items.push(item);
            }
        } else if let Some(last) = items.last_mut() {
            let continuation = line.trim();
            if !continuation.is_empty() {
                last.push(' ');
                last.push_str(continuation);
            }
        }
    }

    items.truncate(MAX_LIST_ITEMS);
    items
}

/// First number on the first non-empty line of a score body, clamped to `[0, 10]`.
pub fn parse_score(body: &str) -> Option<f64> {
    let line = body.lines().find(|l| !l.trim().is_empty())?;
    let value: f64 = NUMBER.find(line)?.as_str().parse().ok()?;
    Some(value.clamp(0.0, 10.0))
}

/// Read a yes/no decision. The earliest approving or rejecting word wins.
pub fn parse_approval(body: &str) -> Option<bool> {
    let approve = APPROVE_WORD.find(body).map(|m| m.start());
    let reject = REJECT_WORD.find(body).map(|m| m.start());

    match (approve, reject) {
        (Some(a), Some(r)) => Some(a < r),
        (Some(_), None) => Some(true),
        (None, Some(_)) => Some(false),
        (None, None) => None,
    }
}

/// Fields recovered from a single stage's text; `None` means not found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialSummary {
    pub executive_summary: Option<String>,
    pub detailed_summary: Option<String>,
    pub key_takeaways: Option<Vec<String>>,
    pub key_topics: Option<Vec<String>>,
    pub important_quotes: Option<Vec<String>>,
    pub target_audience: Option<String>,
    pub content_category: Option<String>,
    pub relevance_score: Option<f64>,
    pub completeness_score: Option<f64>,
    pub accuracy_assessment: Option<String>,
    pub improvement_suggestions: Option<Vec<String>>,
    pub final_verdict: Option<String>,
    pub approved: Option<bool>,
}

impl PartialSummary {
    /// Whether nothing at all was recognised.
    pub fn is_empty(&self) -> bool {
        *self == PartialSummary::default()
    }
}

/// Apply section, list, score and approval parsing to one text.
pub fn extract_fields(text: &str) -> PartialSummary {
    let sections = extract_sections(text);

    let text_field = |field| sections.get(field).map(strip_emphasis).filter(|s| !s.is_empty());
    let list_field = |field| {
        sections
            .get(field)
            .map(parse_list)
            .filter(|items| !items.is_empty())
    };

    PartialSummary {
        executive_summary: text_field(SummaryField::ExecutiveSummary),
        detailed_summary: text_field(SummaryField::DetailedSummary),
        key_takeaways: list_field(SummaryField::KeyTakeaways),
        key_topics: list_field(SummaryField::KeyTopics),
        important_quotes: list_field(SummaryField::ImportantQuotes)
            .map(|quotes| quotes.iter().map(|q| strip_quotes(q)).collect()),
        target_audience: text_field(SummaryField::TargetAudience),
        content_category: text_field(SummaryField::ContentCategory),
        relevance_score: sections.get(SummaryField::RelevanceScore).and_then(parse_score),
        completeness_score: sections.get(SummaryField::CompletenessScore).and_then(parse_score),
        accuracy_assessment: text_field(SummaryField::AccuracyAssessment),
        improvement_suggestions: list_field(SummaryField::ImprovementSuggestions),
        final_verdict: text_field(SummaryField::FinalVerdict),
        approved: sections.get(SummaryField::Approved).and_then(parse_approval),
    }
}

fn strip_quotes(text: &str) -> String {
    text.trim_matches(|c| matches!(c, '"' | '“' | '”' | '\''))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
Executive Summary: The video explains Topic A.
It also covers X.

Detailed Summary:
Topic A matters because it enables X.

Key Takeaways:
- Topic A is important.
- Topic A enables X.

Target Audience: Engineers
Content Category: Educational

Relevance Score: 8/10
Completeness Score: 7.5
Improvement Suggestions:
1. Add examples.
2. Mention limitations.
Final Verdict: Solid summary.
Approved: Yes
";

    #[test]
    fn test_well_formed_sections() {
        let fields = extract_fields(WELL_FORMED);

        assert_eq!(
            fields.executive_summary.as_deref(),
            Some("The video explains Topic A.\nIt also covers X.")
        );
        assert_eq!(
            fields.detailed_summary.as_deref(),
            Some("Topic A matters because it enables X.")
        );
        assert_eq!(
            fields.key_takeaways,
            Some(vec![
                "Topic A is important.".to_string(),
                "Topic A enables X.".to_string()
            ])
        );
        assert_eq!(fields.target_audience.as_deref(), Some("Engineers"));
        assert_eq!(fields.content_category.as_deref(), Some("Educational"));
        assert_eq!(fields.relevance_score, Some(8.0));
        assert_eq!(fields.completeness_score, Some(7.5));
        assert_eq!(
            fields.improvement_suggestions,
            Some(vec!["Add examples.".to_string(), "Mention limitations.".to_string()])
        );
        assert_eq!(fields.final_verdict.as_deref(), Some("Solid summary."));
        assert_eq!(fields.approved, Some(true));
    }

    #[test]
    fn test_markdown_decorated_headings() {
        let text = "\
## Executive Summary
A short overview.

**Key Takeaways:**
* First point
* Second point

- **Relevance Score:** 9/10
1. RELEVANCE (Score 0-10): ignored because the first one wins
**Approved**: No
";
        let fields = extract_fields(text);
        assert_eq!(fields.executive_summary.as_deref(), Some("A short overview."));
        assert_eq!(
            fields.key_takeaways,
            Some(vec!["First point".to_string(), "Second point".to_string()])
        );
        assert_eq!(fields.relevance_score, Some(9.0));
        assert_eq!(fields.approved, Some(false));
    }

    #[test]
    fn test_parenthetical_heading() {
        let fields = extract_fields("RELEVANCE (Score 0-10): 6\nCOMPLETENESS (Score 0-10): 4");
        assert_eq!(fields.relevance_score, Some(6.0));
        assert_eq!(fields.completeness_score, Some(4.0));
    }

    #[test]
    fn test_missing_sections_are_none() {
        let fields = extract_fields("Executive Summary: Only this.");
        assert_eq!(fields.executive_summary.as_deref(), Some("Only this."));
        assert_eq!(fields.key_takeaways, None);
        assert_eq!(fields.relevance_score, None);
        assert_eq!(fields.approved, None);
    }

    #[test]
    fn test_unstructured_text() {
        assert!(extract_fields("The model rambled without any headings at all.").is_empty());
        assert!(extract_fields("").is_empty());
    }

    #[test]
    fn test_sentence_starting_with_label_is_not_heading() {
        let sections = extract_sections("Relevance to the source is high.\nQuality matters here.");
        assert!(sections.is_empty());
    }

    #[test]
    fn test_labeled_list_items_stay_in_list() {
        let fields = extract_fields(
            "Key Takeaways:\n- Topic A is important.\n- Context: Topic A dates from 2010.\n- Topic A enables X.\n\nRelevance Score: 8/10",
        );
        assert_eq!(
            fields.key_takeaways,
            Some(vec![
                "Topic A is important.".to_string(),
                "Context: Topic A dates from 2010.".to_string(),
                "Topic A enables X.".to_string()
            ])
        );
        assert_eq!(fields.relevance_score, Some(8.0));

        let fields = extract_fields(
            "Key Takeaways:\n- Relevance: 2 frameworks are compared.\n- Topic A enables X.\n\nRelevance Score: 9/10",
        );
        assert_eq!(
            fields.key_takeaways,
            Some(vec![
                "Relevance: 2 frameworks are compared.".to_string(),
                "Topic A enables X.".to_string()
            ])
        );
        assert_eq!(fields.relevance_score, Some(9.0));
    }

    #[test]
    fn test_bulleted_headings_still_recognised() {
        assert!(is_heading_line("- **Relevance:** 8"));
        assert!(is_heading_line("2. Relevance (Score 0-10): 8"));
        assert!(is_heading_line("- Approval:"));
        assert!(is_heading_line("- Relevance Score: 8/10"));
        assert!(!is_heading_line("- Verdict: looks good"));
        assert!(is_heading_line("Verdict: looks good"));
    }

    #[test]
    fn test_first_nonempty_occurrence_wins() {
        let sections = extract_sections("Executive Summary:\n\nKey Takeaways:\n- a point\nExecutive Summary: second");
        assert_eq!(sections.get(SummaryField::ExecutiveSummary), Some("second"));
    }

    #[test]
    fn test_score_clamping() {
        assert_eq!(parse_score("15/10"), Some(10.0));
        assert_eq!(parse_score("-3"), Some(0.0));
        assert_eq!(parse_score("7.25 out of 10"), Some(7.25));
        assert_eq!(parse_score("N/A"), None);
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("\n  \n8"), Some(8.0));

        let fields = extract_fields("Relevance Score: 15/10\nCompleteness Score: high");
        assert_eq!(fields.relevance_score, Some(10.0));
        assert_eq!(fields.completeness_score, None);
    }

    #[test]
    fn test_parse_list_markers_and_continuations() {
        let body = "Intro text that is not an item\n- one\n  continues here\n2) two\n+ three\n\n• four";
        assert_eq!(
            parse_list(body),
            vec!["one continues here", "two", "three", "four"]
        );
        assert!(parse_list("no markers\nat all").is_empty());
    }

    #[test]
    fn test_parse_list_caps_items() {
        let body = (1..=15).map(|i| format!("- item {}", i)).collect::<Vec<_>>().join("\n");
        let items = parse_list(&body);
        assert_eq!(items.len(), MAX_LIST_ITEMS);
        assert_eq!(items[0], "item 1");
    }

    #[test]
    fn test_parse_approval() {
        assert_eq!(parse_approval("Yes"), Some(true));
        assert_eq!(parse_approval("Approved for publication"), Some(true));
        assert_eq!(parse_approval("Not approved"), Some(false));
        assert_eq!(parse_approval("No"), Some(false));
        assert_eq!(parse_approval("Needs improvement"), Some(false));
        assert_eq!(parse_approval("Yes - no major issues"), Some(true));
        assert_eq!(parse_approval("Pending review"), None);
    }

    #[test]
    fn test_quotes_are_unwrapped() {
        let fields = extract_fields("Important Quotes:\n- \"Topic A is important.\"\n- “Topic A enables X.”");
        assert_eq!(
            fields.important_quotes,
            Some(vec!["Topic A is important.".to_string(), "Topic A enables X.".to_string()])
        );
    }

    #[test]
    fn test_horizontal_rules_dropped() {
        let fields = extract_fields("Executive Summary: Body text.\n---\n");
        assert_eq!(fields.executive_summary.as_deref(), Some("Body text."));
    }
}
