//! Doctor command - verify the model endpoint, external tools and output directory.

use crate::cli::Output;
use crate::config::Settings;
use crate::generation::OpenAIGenerator;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("tubesum Doctor");
    println!();
    println!("Checking the model endpoint, tools and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Model Endpoint").bold());
    let endpoint_checks = check_endpoint(settings).await;
    for check in &endpoint_checks {
        check.print();
    }
    checks.extend(endpoint_checks);

    println!();

    println!("{}", style("External Tools").bold());
    let tool_check = check_tool("yt-dlp", "yt-dlp --version", install_hint_ytdlp());
    tool_check.print();
    checks.push(tool_check);

    println!();

    println!("{}", style("Output").bold());
    let dir_check = check_output_dir(&settings.output_dir());
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using tubesum.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! tubesum is ready to use.");
    }

    Ok(())
}

/// Reach the `/models` endpoint and look for the configured model.
async fn check_endpoint(settings: &Settings) -> Vec<CheckResult> {
    let generation = &settings.generation;
    let name = "Endpoint";

    let generator = match OpenAIGenerator::new(generation) {
        Ok(generator) => generator,
        Err(e) => return vec![CheckResult::error(name, &format!("client error: {}", e), endpoint_hint())],
    };

    match generator.list_models().await {
        Ok(models) => vec![
            CheckResult::ok(name, &format!("{} ({} models)", generation.base_url, models.len())),
            check_model_listed(&generation.model, &models),
        ],
        Err(e) => vec![CheckResult::error(
            name,
            &format!("{} unreachable: {}", generation.base_url, e),
            endpoint_hint(),
        )],
    }
}

fn check_model_listed(model: &str, available: &[String]) -> CheckResult {
    if available.iter().any(|m| m == model) {
        CheckResult::ok("Model", model)
    } else {
        CheckResult::warning(
            "Model",
            &format!("{} not listed by the endpoint", model),
            &format!("Pull it with: ollama pull {}", model),
        )
    }
}

/// Check if an external tool is available. yt-dlp only supplies titles, so
/// a missing tool is a warning.
fn check_tool(name: &str, version_cmd: &str, hint: &str) -> CheckResult {
    let mut parts = version_cmd.split_whitespace();
    let Some(cmd) = parts.next() else {
        return CheckResult::error(name, "no command", hint);
    };

    match Command::new(cmd).args(parts).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::warning(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::warning(name, "not found (titles fall back to the video ID)", hint)
        }
        Err(e) => CheckResult::warning(name, &format!("error: {}", e), hint),
    }
}

/// Create the output directory if needed and probe it with a scratch file.
fn check_output_dir(dir: &Path) -> CheckResult {
    let name = "Output directory";
    let hint = "Set output.dir in the config file, TUBESUM_OUTPUT_DIR, or --output-dir";

    if let Err(e) = std::fs::create_dir_all(dir) {
        return CheckResult::error(name, &format!("{} cannot be created: {}", dir.display(), e), hint);
    }

    let probe = dir.join(".tubesum-write-test");
    match std::fs::write(&probe, b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            CheckResult::ok(name, &dir.display().to_string())
        }
        Err(e) => CheckResult::error(name, &format!("{} is not writable: {}", dir.display(), e), hint),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: tubesum config init",
        )
    }
}

fn endpoint_hint() -> &'static str {
    "Start Ollama (ollama serve) or set OLLAMA_BASE_URL"
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}
