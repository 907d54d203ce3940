//! InspireBot: one uplifting line per run

use super::{mcp_server_spec, preflight, DEFAULT_MODEL};
use crate::config::CliConfigLoader;
use crate::output::{typewrite, InspireOutput};
use crate::prompts::{PromptTemplates, INSPIRE_DEFAULT_TOPIC, INSPIRE_SYSTEM_PROMPT};
use anyhow::{anyhow, Result};
use console::{style, Term};
use std::time::Duration;
use tether_core::tools::builtin::random_quote;
use tether_core::tools::INSPIRE_UTIL;
use tether_core::{AgentOptions, AppSettings, ResilientClient, Session, TurnOutcome};
use tracing::warn;

const INSPIRE_ALIAS: &str = "inspire_util";
const TYPEWRITER_DELAY: Duration = Duration::from_millis(20);

/// Agent options for InspireBot
pub fn inspire_options(settings: &AppSettings) -> Result<AgentOptions> {
    let options = settings
        .make_options(DEFAULT_MODEL)
        .with_system_prompt(INSPIRE_SYSTEM_PROMPT)
        .with_allowed_tools(["WebSearch"])
        .with_allowed_tools(INSPIRE_UTIL.allowed_tool_names(INSPIRE_ALIAS))
        .with_mcp_server(INSPIRE_ALIAS, mcp_server_spec(INSPIRE_UTIL, settings)?);

    options.validate()?;
    Ok(options)
}

/// Topic from the command line words, or the default
pub fn topic_from_args(words: &[String]) -> String {
    let topic = words.join(" ");
    let topic = topic.trim();
    if topic.is_empty() {
        INSPIRE_DEFAULT_TOPIC.to_string()
    } else {
        topic.to_string()
    }
}

/// Ask for a quote on `topic` and print a single line
pub async fn inspire_command(loader: CliConfigLoader, topic: Vec<String>) -> Result<()> {
    let settings = loader.load().await?;
    preflight(&settings).await?;

    let topic = topic_from_args(&topic);
    let prompt = PromptTemplates::new()?.inspire(&topic)?;
    let interactive = Term::stdout().is_term();

    if interactive {
        println!("{}", style("🌐 InspireBot (WebSearch + fallback tool)").bold());
        println!(
            "{}",
            style("Tip: pass a topic, e.g. `tether inspire shipping small changes`").dim()
        );
    }

    let client = ResilientClient::cli();
    let mut session = Session::new(inspire_options(&settings)?);
    let output = InspireOutput::new();

    match client.run_turn(&mut session, &prompt, &output).await {
        TurnOutcome::Replied { .. } => {}
        TurnOutcome::NoReply(reason) => warn!("No reply, using a fallback quote: {}", reason),
        TurnOutcome::Rejected => warn!("Turn rejected, using a fallback quote"),
    }
    client.reset(&mut session).await;

    let mut line = output.final_line().await;
    if line.is_empty() {
        line = random_quote().to_string();
    }

    if interactive {
        typewrite(&line, TYPEWRITER_DELAY)
            .await
            .map_err(|e| anyhow!("Failed to write output: {}", e))?;
    } else {
        println!("{}", line);
    }
    Ok(())
}
