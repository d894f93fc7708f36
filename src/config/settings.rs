//! Configuration settings for tubesum.

use crate::error::{Result, TubesumError};
use crate::stages::StageKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub generation: GenerationSettings,
    pub stages: StageSettings,
    pub transcript: TranscriptSettings,
    pub output: OutputSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Text-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base address of an OpenAI-compatible API (Ollama serves one under /v1).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key. Local Ollama ignores it but the client always sends one.
    pub api_key: Option<String>,
    /// Token budget per stage call.
    pub max_tokens: u32,
    /// Timeout for a single generation call, in seconds.
    pub call_timeout_secs: u64,
    /// Wall-clock ceiling for all three stages together, in seconds.
    pub run_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.2:latest".to_string(),
            api_key: None,
            max_tokens: 1024,
            call_timeout_secs: 15,
            run_timeout_secs: 600,
        }
    }
}

impl GenerationSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Per-stage sampling temperatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    pub analysis_temperature: f32,
    pub writing_temperature: f32,
    pub critique_temperature: f32,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            analysis_temperature: 0.3,
            writing_temperature: 0.7,
            critique_temperature: 0.2,
        }
    }
}

impl StageSettings {
    /// Temperature configured for the given stage.
    pub fn temperature(&self, stage: StageKind) -> f32 {
        match stage {
            StageKind::Analysis => self.analysis_temperature,
            StageKind::Writing => self.writing_temperature,
            StageKind::Critique => self.critique_temperature,
        }
    }
}

/// Caption retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred caption languages, in priority order.
    pub languages: Vec<String>,
    /// Upper bound on transcript characters handed to the model (None = unbounded).
    pub max_chars: Option<usize>,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "en-US".to_string()],
            max_chars: None,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory receiving the JSON and Markdown files.
    pub dir: String,
    /// Also write each stage's raw text next to the summary.
    pub save_stage_outputs: bool,
    /// Print the summary preview after a run.
    pub preview: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: "outputs".to_string(),
            save_stage_outputs: false,
            preview: true,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Apply environment overrides on top of file settings.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OLLAMA_BASE_URL") {
            self.generation.base_url = normalize_base_url(&v);
        }
        if let Some(v) = get("OLLAMA_MODEL") {
            self.generation.model = v;
        }
        if let Some(v) = get("TUBESUM_API_KEY") {
            self.generation.api_key = Some(v);
        }
        if let Some(v) = get("MODEL_TEMPERATURE") {
            self.stages.writing_temperature = parse_var("MODEL_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("MAX_TOKENS") {
            self.generation.max_tokens = parse_var("MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("TUBESUM_CALL_TIMEOUT_SECS") {
            self.generation.call_timeout_secs = parse_var("TUBESUM_CALL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("TUBESUM_RUN_TIMEOUT_SECS") {
            self.generation.run_timeout_secs = parse_var("TUBESUM_RUN_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("TUBESUM_OUTPUT_DIR") {
            self.output.dir = v;
        }

        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TubesumError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubesum")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.output.dir)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TubesumError::Config(format!("{} has an invalid value: {}", key, value)))
}

/// Ollama users usually export the bare host; the chat API lives under /v1.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.generation.base_url, "http://localhost:11434/v1");
        assert_eq!(settings.generation.call_timeout_secs, 15);
        assert_eq!(settings.generation.run_timeout_secs, 600);
        assert_eq!(settings.output.dir, "outputs");
        assert!(settings.stages.writing_temperature > settings.stages.analysis_temperature);
        assert!(settings.stages.writing_temperature > settings.stages.critique_temperature);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_vars(lookup(&[
                ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
                ("OLLAMA_MODEL", "mistral:7b"),
                ("MAX_TOKENS", "2048"),
                ("TUBESUM_CALL_TIMEOUT_SECS", "30"),
                ("TUBESUM_OUTPUT_DIR", "/tmp/summaries"),
            ]))
            .unwrap();

        assert_eq!(settings.generation.base_url, "http://gpu-box:11434/v1");
        assert_eq!(settings.generation.model, "mistral:7b");
        assert_eq!(settings.generation.max_tokens, 2048);
        assert_eq!(settings.generation.call_timeout_secs, 30);
        assert_eq!(settings.output.dir, "/tmp/summaries");
        // Untouched values keep their defaults
        assert_eq!(settings.generation.run_timeout_secs, 600);
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        let mut settings = Settings::default();
        let err = settings
            .apply_vars(lookup(&[("MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, TubesumError::Config(_)));
    }

    #[test]
    fn test_blank_env_value_ignored() {
        let mut settings = Settings::default();
        settings.apply_vars(lookup(&[("OLLAMA_MODEL", "  ")])).unwrap();
        assert_eq!(settings.generation.model, "llama3.2:latest");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [generation]
            model = "llama3:8b"

            [output]
            save_stage_outputs = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.generation.model, "llama3:8b");
        assert_eq!(settings.generation.max_tokens, 1024);
        assert!(settings.output.save_stage_outputs);
        assert_eq!(settings.transcript.languages, vec!["en", "en-US"]);
    }

    #[test]
    fn test_stage_temperature_lookup() {
        let stages = StageSettings::default();
        assert_eq!(stages.temperature(StageKind::Analysis), 0.3);
        assert_eq!(stages.temperature(StageKind::Writing), 0.7);
        assert_eq!(stages.temperature(StageKind::Critique), 0.2);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.generation.model = "qwen2.5:7b".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.generation.model, "qwen2.5:7b");
    }
}
