//! Summarize command: one video, or an interactive prompt loop.

use crate::cli::{print_preview, Output};
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, RunOutcome, RunReport};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the summarize command. Without a URL, prompts for videos until the user quits.
pub async fn run_summarize(url: Option<&str>, settings: Settings) -> Result<()> {
    let preview = settings.output.preview;
    let orchestrator = Orchestrator::new(settings)?;

    match url {
        Some(url) => summarize_one(&orchestrator, url, preview).await,
        None => run_interactive(&orchestrator, preview).await,
    }
}

async fn summarize_one(orchestrator: &Orchestrator, input: &str, preview: bool) -> Result<()> {
    Output::info(&format!("Processing: {}", input));

    let spinner = Output::spinner("Fetching transcript and running analysis, writing and critique...");
    let result = orchestrator.summarize(input).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            report_run(&report, preview);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to summarize: {}", e));
            Err(e.into())
        }
    }
}

async fn run_interactive(orchestrator: &Orchestrator, preview: bool) -> Result<()> {
    println!("\n{}", style("tubesum").bold().cyan());
    println!(
        "{}\n",
        style("Paste a YouTube URL or video ID, or 'quit' to exit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Video:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if is_quit_command(input) {
            Output::info("Goodbye!");
            break;
        }

        // Already reported; keep prompting.
        if let Err(e) = summarize_one(orchestrator, input, preview).await {
            debug!("Run failed: {}", e);
        }

        println!();
    }

    Ok(())
}

fn report_run(report: &RunReport, preview: bool) {
    match report.outcome() {
        RunOutcome::Complete => {
            Output::success(&format!("Summarized '{}'", report.record.video.title));
        }
        RunOutcome::Degraded { reasons } => {
            Output::warning(&format!(
                "Summarized '{}' with reduced quality:",
                report.record.video.title
            ));
            for reason in reasons {
                Output::list_item(reason);
            }
        }
    }

    Output::kv("JSON", &report.paths.json.display().to_string());
    Output::kv("Markdown", &report.paths.markdown.display().to_string());
    for path in &report.paths.stage_files {
        Output::kv("Stage", &path.display().to_string());
    }

    if preview {
        print_preview(&report.record);
    }
}

/// Whether interactive input asks to leave the loop.
fn is_quit_command(input: &str) -> bool {
    ["quit", "exit", "q"]
        .iter()
        .any(|cmd| input.eq_ignore_ascii_case(cmd))
}
