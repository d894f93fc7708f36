//! Prompt templates for tubesum.
//!
//! Each stage has a fixed role description (sent as the system message) and an
//! instruction template. Templates use `{{name}}` placeholders. Prompts can be
//! customized by placing a `stages.toml` file in the custom prompts directory.

use crate::stages::StageKind;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub analysis: StagePrompt,
    pub writing: StagePrompt,
    pub critique: StagePrompt,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Role and instruction template for one stage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StagePrompt {
    pub role: String,
    pub instructions: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            analysis: StagePrompt {
                role: r#"You are a Content Listener Specialist with exceptional ability to capture the essence of video content.

Your expertise lies in:
- Identifying core themes and main topics
- Extracting the most impactful quotes and statements
- Recognizing key arguments and supporting evidence
- Distilling complex information into essential insights

You focus on quality over quantity and never invent content that is not in the transcript."#
                    .to_string(),
                instructions: r#"Analyze this video content and extract its key insights.

{{context}}

Structure your answer with these headings, each followed by a colon:

Executive Summary: 2-3 sentences on what the video is about and its core message.
Key Topics: 4-6 bullet points ("- ") naming the core themes.
Important Quotes: 3-5 bullet points with the most significant statements, quoted verbatim.
Supporting Evidence: bullet points with data, statistics or examples mentioned.
Target Audience: who the content is aimed at.

Extract only what is supported by the transcript."#
                    .to_string(),
            },
            writing: StagePrompt {
                role: r#"You are an Expert Content Writer who turns raw insights into clear, well-structured, valuable written summaries.

You excel at:
- Crafting compelling executive summaries
- Writing detailed content that flows naturally
- Creating actionable takeaways that provide real value
- Adapting tone for the intended audience"#
                    .to_string(),
                instructions: r#"Transform the analysis below into a polished, professional summary of the video.

{{context}}

Use exactly these headings, each followed by a colon:

Executive Summary: 1-2 paragraphs with a high-level overview.
Detailed Summary: 3-5 paragraphs covering the key insights and learnings.
Key Takeaways: 4-6 actionable bullet points, each starting with "- ".
Target Audience: who would benefit most from this content.
Content Category: the type or genre of the content.

Write in a professional yet engaging tone."#
                    .to_string(),
            },
            critique: StagePrompt {
                role: r#"You are a Quality Assurance Critic with an eye for detail.

You evaluate summaries against their source material for relevance, accuracy and completeness, and you give objective, specific, actionable feedback."#
                    .to_string(),
                instructions: r#"Evaluate the summary written by the Content Writer against the original analysis and transcript.

{{context}}

Original transcript excerpt for reference:
{{transcript_excerpt}}

Answer with exactly these headings, each followed by a colon:

Executive Summary: the final executive summary, corrected where needed.
Key Takeaways: the final takeaways as bullet points starting with "- ".
Relevance Score: a number from 0 to 10 for how well the summary captures the video.
Completeness Score: a number from 0 to 10 for how thoroughly the content is covered.
Accuracy Assessment: whether the information is represented correctly.
Improvement Suggestions: 3-5 bullet points starting with "- ".
Final Verdict: one or two sentences.
Approved: Yes or No."#
                    .to_string(),
            },
            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let stages_path = custom_path.join("stages.toml");
            if stages_path.exists() {
                let content = std::fs::read_to_string(&stages_path)?;
                prompts = Self::merge_custom(prompts, toml::from_str(&content)?);
            }
        }

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        Ok(prompts)
    }

    /// Overlay non-empty fields of a custom prompt file onto the defaults.
    fn merge_custom(mut base: Prompts, custom: CustomPrompts) -> Prompts {
        for (target, overlay) in [
            (&mut base.analysis, custom.analysis),
            (&mut base.writing, custom.writing),
            (&mut base.critique, custom.critique),
        ] {
            if let Some(overlay) = overlay {
                if !overlay.role.trim().is_empty() {
                    target.role = overlay.role;
                }
                if !overlay.instructions.trim().is_empty() {
                    target.instructions = overlay.instructions;
                }
            }
        }
        base
    }

    /// Templates for one stage.
    pub fn for_stage(&self, stage: StageKind) -> &StagePrompt {
        match stage {
            StageKind::Analysis => &self.analysis,
            StageKind::Writing => &self.writing,
            StageKind::Critique => &self.critique,
        }
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template, so placeholders inside
    /// substituted values stay literal. Unknown placeholders are left as-is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

/// Shape of `stages.toml`; every stage is optional.
#[derive(Debug, Default, Deserialize)]
struct CustomPrompts {
    analysis: Option<StagePrompt>,
    writing: Option<StagePrompt>,
    critique: Option<StagePrompt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        for stage in StageKind::ALL {
            let prompt = prompts.for_stage(stage);
            assert!(!prompt.role.is_empty());
            assert!(prompt.instructions.contains("{{context}}"));
        }
        assert!(prompts.critique.instructions.contains("Relevance Score"));
        assert!(prompts.writing.instructions.contains("Key Takeaways"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_substituted_values() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "The speaker said {{title}} twice.".to_string());
        vars.insert("title".to_string(), "Topic A".to_string());

        let result = Prompts::render("{{title}}: {{context}} {{missing}}", &vars);
        assert_eq!(result, "Topic A: The speaker said {{title}} twice. {{missing}}");
    }

    #[test]
    fn test_render_with_custom_prefers_provided() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("tone".into(), "formal".into());
        prompts.variables.insert("lang".into(), "English".into());

        let mut vars = HashMap::new();
        vars.insert("tone".to_string(), "casual".to_string());

        let out = prompts.render_with_custom("{{tone}} / {{lang}}", &vars);
        assert_eq!(out, "casual / English");
    }

    #[test]
    fn test_load_custom_stage_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("stages.toml"),
            r#"
            [writing]
            instructions = "Write briefly.\n{{context}}"
            "#,
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.writing.instructions, "Write briefly.\n{{context}}");
        // Role not given in the file, so the default stays
        assert!(prompts.writing.role.contains("Expert Content Writer"));
        assert!(prompts.analysis.instructions.contains("Key Topics"));
    }
}
