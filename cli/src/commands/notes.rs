//! NoteSmith: research assistant REPL with local notes

use super::{failure_detail, mcp_server_spec, preflight, DEFAULT_MODEL};
use crate::config::CliConfigLoader;
use crate::output::NotesOutput;
use crate::prompts::{PromptTemplates, NOTESMITH_HELP, NOTESMITH_SYSTEM_PROMPT};
use anyhow::Result;
use console::style;
use std::io::Write;
use std::sync::Arc;
use tether_core::config::DEFAULT_PERMISSION_MODE;
use tether_core::hooks::{DangerousCommandGuard, HookEvent, HookMatcher, HookRegistry};
use tether_core::tools::NOTES_UTIL;
use tether_core::{AgentOptions, AppSettings, ResilientClient, Session, TurnOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

const NOTES_ALIAS: &str = "utils";

/// What a line of NoteSmith input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesInput {
    Empty,
    Exit,
    Help,
    Prompt(String),
}

/// Interpret one input line; slash commands become tool-directed prompts
pub fn parse_input(line: &str, templates: &PromptTemplates) -> Result<NotesInput> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(NotesInput::Empty);
    }

    let lower = line.to_lowercase();
    if matches!(lower.as_str(), "/exit" | "exit" | "quit") {
        return Ok(NotesInput::Exit);
    }
    if matches!(lower.as_str(), "/help" | "help") {
        return Ok(NotesInput::Help);
    }

    let prompt = if let Some(url) = line.strip_prefix("/summarize ") {
        templates.summarize(url.trim())?
    } else if let Some(text) = line.strip_prefix("/note ") {
        templates.save_note(text.trim())?
    } else if let Some(pattern) = line.strip_prefix("/find ") {
        templates.find_note(pattern.trim())?
    } else {
        line.to_string()
    };

    Ok(NotesInput::Prompt(prompt))
}

/// Agent options for NoteSmith
pub fn notes_options(settings: &AppSettings) -> Result<AgentOptions> {
    let hooks = HookRegistry::new().with_matcher(
        HookEvent::PreToolUse,
        HookMatcher::all(vec![Arc::new(DangerousCommandGuard::default())]),
    );

    let options = settings
        .make_options(DEFAULT_MODEL)
        .with_permission_mode(settings.permission_mode.or(Some(DEFAULT_PERMISSION_MODE)))
        .with_system_prompt(NOTESMITH_SYSTEM_PROMPT)
        .with_allowed_tools(["WebFetch", "Read", "Write", "Grep", "Glob"])
        .with_allowed_tools(NOTES_UTIL.allowed_tool_names(NOTES_ALIAS))
        .with_mcp_server(NOTES_ALIAS, mcp_server_spec(NOTES_UTIL, settings)?)
        .with_hooks(hooks);

    options.validate()?;
    Ok(options)
}

/// Run the NoteSmith loop until `/exit` or end of input
pub async fn notes_command(loader: CliConfigLoader) -> Result<()> {
    let settings = loader.load().await?;
    preflight(&settings).await?;

    let templates = PromptTemplates::new()?;
    let options = notes_options(&settings)?;
    let model = options
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let client = ResilientClient::cli();
    let mut session = Session::new(options);

    println!("{}", style("💡 NoteSmith (Claude Sonnet)").bold());
    println!("{}", NOTESMITH_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{} ", style("You:").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let prompt = match parse_input(&line, &templates)? {
            NotesInput::Empty => continue,
            NotesInput::Exit => break,
            NotesInput::Help => {
                println!("{}", NOTESMITH_HELP);
                continue;
            }
            NotesInput::Prompt(prompt) => prompt,
        };

        let output = NotesOutput::new(model.as_str());
        match client.run_turn(&mut session, &prompt, &output).await {
            TurnOutcome::Replied { .. } => {}
            TurnOutcome::NoReply(reason) => {
                eprintln!(
                    "{} {}",
                    style("No reply due to CLI error:").red(),
                    failure_detail(&reason)
                );
            }
            TurnOutcome::Rejected => {
                eprintln!("{}", style("A turn is already in progress.").yellow());
            }
        }
    }

    client.reset(&mut session).await;
    println!("Bye!");
    Ok(())
}
