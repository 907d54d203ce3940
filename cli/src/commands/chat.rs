//! Interactive chat over the resilient client

use super::{failure_detail, mcp_server_spec, preflight, DEFAULT_MODEL};
use crate::config::CliConfigLoader;
use crate::output::{CliOutputConfig, CliOutputHandler};
use crate::prompts::CHAT_SYSTEM_PROMPT;
use anyhow::Result;
use console::style;
use std::io::Write;
use std::sync::Arc;
use tether_core::config::DEFAULT_PERMISSION_MODE;
use tether_core::hooks::{
    DangerousCommandGuard, HookEvent, HookMatcher, HookRegistry, ToolLogHook,
};
use tether_core::tools::UTILITIES;
use tether_core::{AgentOptions, AppSettings, ResilientClient, Session, TurnOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Alias the utilities server is mounted under
const UTILITIES_ALIAS: &str = "utils";

/// Agent options for the chat application
pub fn chat_options(settings: &AppSettings) -> Result<AgentOptions> {
    let hooks = HookRegistry::new()
        .with_matcher(
            HookEvent::PreToolUse,
            HookMatcher::all(vec![Arc::new(ToolLogHook::new(HookEvent::PreToolUse))]),
        )
        .with_matcher(
            HookEvent::PreToolUse,
            HookMatcher::tool("Bash", vec![Arc::new(DangerousCommandGuard::default())]),
        )
        .with_matcher(
            HookEvent::PostToolUse,
            HookMatcher::all(vec![Arc::new(ToolLogHook::new(HookEvent::PostToolUse))]),
        );

    let options = settings
        .make_options(DEFAULT_MODEL)
        .with_permission_mode(settings.permission_mode.or(Some(DEFAULT_PERMISSION_MODE)))
        .with_system_prompt(CHAT_SYSTEM_PROMPT)
        .with_allowed_tools(["Read", "Write"])
        .with_allowed_tools(UTILITIES.allowed_tool_names(UTILITIES_ALIAS))
        .with_mcp_server(UTILITIES_ALIAS, mcp_server_spec(UTILITIES, settings)?)
        .with_hooks(hooks);

    options.validate()?;
    Ok(options)
}

fn print_history(session: &Session) {
    if session.transcript().is_empty() {
        println!("{}", style("(no messages yet)").dim());
        return;
    }
    for entry in session.transcript().entries() {
        println!(
            "{} {}: {}",
            style(entry.timestamp.format("%H:%M:%S")).dim(),
            style(entry.role.as_str()).bold(),
            entry.text
        );
    }
}

/// Run the chat loop until `/exit` or end of input
pub async fn chat_command(loader: CliConfigLoader) -> Result<()> {
    let settings = loader.load().await?;
    let cli = preflight(&settings).await?;
    println!(
        "{} {} {}",
        style("CLI OK:").green().bold(),
        cli.version,
        style(format!("@ {}", cli.path.display())).dim()
    );

    let client = ResilientClient::cli();
    let mut session = Session::new(chat_options(&settings)?);
    info!("Chat session {} started", session.id());

    println!(
        "{}",
        style("Type a message. /new starts over, /history shows the conversation, /exit quits.")
            .dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{} ", style("You:").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/exit" | "/quit" => break,
            "/new" => {
                client.reset(&mut session).await;
                println!("{}", style("Started a new conversation.").dim());
                continue;
            }
            "/history" => {
                print_history(&session);
                continue;
            }
            _ => {}
        }

        let output = CliOutputHandler::new(CliOutputConfig {
            realtime_updates: true,
            spinner: true,
        });
        let outcome = client.run_turn(&mut session, input, &output).await;
        output.finish().await;

        match outcome {
            TurnOutcome::Replied { reply, reconnected } => {
                if reconnected {
                    eprintln!("{}", style("(reconnected to the agent)").dim());
                }
                if let Some(error) = reply.error {
                    eprintln!("{} {}", style("Stream ended early:").yellow(), error);
                }
            }
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
