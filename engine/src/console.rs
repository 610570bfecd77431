//! Line-oriented chat front end
//!
//! Reads commands from stdin, dispatches them to the orchestrator and prints
//! the transcript as it grows. Lines starting with `/` are commands; anything
//! else is submitted as free text.

use anyhow::{Context, Result};
use rxassist_sdk::{AssistantErrorExt, ProfileField};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use crate::backend::{download_to, Backend};
use crate::config::Config;
use crate::live;
use crate::orchestrator::{Orchestrator, OrchestratorHandle, OrchestratorOptions};
use crate::transcript::{Message, Origin};
use crate::workflow::{resolve_label, Reply, SessionView, Stage, UserAction};

pub const HELP: &str = "\
Commands:
  /upload <file>          Upload a lab report
  /edit <field> <value>   Change a profile field (name, age, weight, height, refdoc)
  /confirm                Confirm the profile
  /yes, /no               Answer the additional tests question
  /toggle <label>         Select or deselect a lab test
  /ok                     Confirm the test selection
  /retry                  Generate the prescription again
  /download [dir]         Save the prescription
  /status                 Show the session state
  /help                   Show this help
  /quit                   Leave
Anything else is sent as a chat message.";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Upload(PathBuf),
    Edit { field: ProfileField, value: String },
    Confirm,
    Answer(Reply),
    Toggle(String),
    Ok,
    Retry,
    Download(Option<PathBuf>),
    Status,
    Help,
    Quit,
    Text(String),
    Empty,
}

/// Why a line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    UnknownField(String),

    #[error("Unknown command '/{0}'. Type /help for a list")]
    UnknownCommand(String),
}

/// Parse one input line
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(ConsoleCommand::Empty);
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return Ok(ConsoleCommand::Text(line.to_string()));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "upload" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("/upload <file>"));
            }
            Ok(ConsoleCommand::Upload(PathBuf::from(rest)))
        }
        "edit" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .map(|(field, value)| (field, value.trim()))
                .unwrap_or((rest, ""));
            if field.is_empty() {
                return Err(ParseError::Usage("/edit <field> <value>"));
            }
            let field = field.parse::<ProfileField>().map_err(ParseError::UnknownField)?;
            Ok(ConsoleCommand::Edit {
                field,
                value: value.to_string(),
            })
        }
        "confirm" | "continue" => Ok(ConsoleCommand::Confirm),
        "yes" => Ok(ConsoleCommand::Answer(Reply::Yes)),
        "no" => Ok(ConsoleCommand::Answer(Reply::No)),
        "toggle" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("/toggle <label>"));
            }
            Ok(ConsoleCommand::Toggle(rest.to_string()))
        }
        "ok" => Ok(ConsoleCommand::Ok),
        "retry" => Ok(ConsoleCommand::Retry),
        "download" => Ok(ConsoleCommand::Download(
            (!rest.is_empty()).then(|| PathBuf::from(rest)),
        )),
        "status" => Ok(ConsoleCommand::Status),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Format a transcript entry
pub fn render_message(message: &Message) -> String {
    match message.origin {
        Origin::User => format!("[{}] you: {}", message.sequence, message.text),
        Origin::System => format!("[{}] assistant: {}", message.sequence, message.text),
    }
}

/// What the user can do next, shown when the stage changes
pub fn render_stage_hint(view: &SessionView) -> Option<String> {
    match view.stage {
        Stage::AwaitingDocument => Some("Reading the document...".to_string()),
        Stage::ProfileReview { confirming: false } => {
            let mut out = String::from("Extracted profile:\n");
            for field in ProfileField::ALL {
                out.push_str(&format!(
                    "  {:<10} {}\n",
                    field.label(),
                    view.profile.display_field(field)
                ));
            }
            out.push_str("Lab results:\n");
            for row in &view.lab_panel {
                out.push_str(&format!("  {:<16} {}\n", row.label, row.value));
            }
            out.push_str("Edit with /edit <field> <value>, then /confirm");
            Some(out)
        }
        Stage::AdditionalTestsDecision => Some("Answer with /yes or /no".to_string()),
        Stage::TestSelection { submitting: false } => {
            let mut out = String::from("Additional tests:\n");
            for label in &view.additional_tests {
                let mark = if view.selection.contains(label) { "x" } else { " " };
                out.push_str(&format!("  [{}] {}\n", mark, label));
            }
            out.push_str("Select with /toggle <label>, then /ok");
            Some(out)
        }
        Stage::GeneratingArtifact {
            in_flight: false, ..
        } => Some("Generation failed. Use /retry to try again".to_string()),
        Stage::Complete { .. } => Some(match &view.artifact {
            Some(artifact) => format!("Prescription ready: {}. Use /download to save it", artifact),
            None => "Prescription ready".to_string(),
        }),
        _ => None,
    }
}

fn render_status(view: &SessionView) -> String {
    let mut out = format!("Stage: {}\n", view.stage);
    out.push_str(&format!("Messages: {}\n", view.messages.len()));
    if view.uploading {
        out.push_str("Upload in progress\n");
    }
    if !view.selection.is_empty() {
        let selected: Vec<&str> = view.selection.iter().collect();
        out.push_str(&format!("Selected tests: {}\n", selected.join(", ")));
    }
    match &view.artifact {
        Some(artifact) => out.push_str(&format!("Prescription: {}", artifact)),
        None => out.push_str("Prescription: none yet"),
    }
    out
}

/// Print new messages and stage hints as snapshots arrive
async fn render_loop(mut views: watch::Receiver<SessionView>) {
    let mut printed = 0u64;
    let mut last_stage: Option<Stage> = None;

    loop {
        let view = views.borrow_and_update().clone();

        for message in view.messages.iter() {
            if message.sequence <= printed {
                continue;
            }
            println!("{}", render_message(message));
            printed = message.sequence;
        }

        if last_stage != Some(view.stage) {
            if let Some(hint) = render_stage_hint(&view) {
                println!("{}", hint);
            }
            last_stage = Some(view.stage);
        }

        if views.changed().await.is_err() {
            break;
        }
    }
}

/// Run an interactive chat session until `/quit` or end of input
pub async fn run(config: &Config, backend: Arc<dyn Backend>) -> Result<()> {
    let live = config.live.enabled.then(|| live::start(config.live.clone()));
    let (handle, task) = Orchestrator::spawn(
        Arc::clone(&backend),
        live,
        OrchestratorOptions::from_config(config),
    );

    let renderer = tokio::spawn(render_loop(handle.subscribe()));
    println!("rxassist chat. Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(command, &handle, backend.as_ref(), config).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{:#}", e),
        }
    }

    handle.shutdown().await;
    drop(handle);
    task.await.context("Session task failed")?;
    renderer.abort();
    Ok(())
}

/// Execute one command. Returns false to leave the session.
async fn execute(
    command: ConsoleCommand,
    handle: &OrchestratorHandle,
    backend: &dyn Backend,
    config: &Config,
) -> Result<bool> {
    let action = match command {
        ConsoleCommand::Empty => return Ok(true),
        ConsoleCommand::Quit => return Ok(false),
        ConsoleCommand::Help => {
            println!("{}", HELP);
            return Ok(true);
        }
        ConsoleCommand::Status => {
            println!("{}", render_status(&handle.view()));
            return Ok(true);
        }
        ConsoleCommand::Download(dir) => {
            let dir = dir.as_deref().unwrap_or(config.core.download_dir.as_path());
            download(handle, backend, dir).await?;
            return Ok(true);
        }
        ConsoleCommand::Upload(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            UserAction::UploadDocument { file_name, bytes }
        }
        ConsoleCommand::Edit { field, value } => UserAction::EditProfile { field, value },
        ConsoleCommand::Confirm => UserAction::ConfirmProfile,
        ConsoleCommand::Answer(reply) => UserAction::Answer(reply),
        ConsoleCommand::Toggle(input) => {
            let view = handle.view();
            match resolve_label(&view.labs, &input) {
                Some(label) => UserAction::ToggleTest(label.to_string()),
                None => {
                    println!("No lab result named '{}'", input);
                    return Ok(true);
                }
            }
        }
        ConsoleCommand::Ok => UserAction::ConfirmSelection,
        ConsoleCommand::Retry => UserAction::RetryGeneration,
        ConsoleCommand::Text(text) => UserAction::SubmitText(text),
    };

    handle.dispatch(action).await?;
    Ok(true)
}

async fn download(handle: &OrchestratorHandle, backend: &dyn Backend, dir: &Path) -> Result<()> {
    let Some(artifact) = handle.view().artifact else {
        println!("No prescription generated yet");
        return Ok(());
    };

    match download_to(backend, &artifact, dir).await {
        Ok(path) => println!("Saved {}", path.display()),
        Err(e) => println!("Download failed: {}. {}", e, e.user_hint()),
    }
    Ok(())
}
