//! One-shot blog outline

use super::{failure_detail, preflight, DEFAULT_MODEL};
use crate::config::CliConfigLoader;
use crate::output::{CliOutputConfig, CliOutputHandler};
use crate::prompts::{OUTLINE_PROMPT, OUTLINE_SYSTEM_PROMPT};
use anyhow::{bail, Result};
use tether_core::{AgentOptions, AppSettings, ResilientClient, Session, TurnOutcome};

pub fn outline_options(settings: &AppSettings) -> Result<AgentOptions> {
    let options = settings
        .make_options(DEFAULT_MODEL)
        .with_system_prompt(OUTLINE_SYSTEM_PROMPT);
    options.validate()?;
    Ok(options)
}

/// Stream the outline to stdout
pub async fn outline_command(loader: CliConfigLoader) -> Result<()> {
    let settings = loader.load().await?;
    preflight(&settings).await?;

    let client = ResilientClient::cli();
    let mut session = Session::new(outline_options(&settings)?);
    let output = CliOutputHandler::new(CliOutputConfig::default());

    let outcome = client.run_turn(&mut session, OUTLINE_PROMPT, &output).await;
    client.reset(&mut session).await;

    match outcome {
        TurnOutcome::Replied { reply, .. } if reply.truncated => {
            bail!(
                "Outline cut short: {}",
                reply.error.unwrap_or_else(|| "stream ended".to_string())
            )
        }
        TurnOutcome::Replied { .. } => Ok(()),
        TurnOutcome::NoReply(reason) => {
            bail!("No reply due to CLI error: {}", failure_detail(&reason))
        }
        TurnOutcome::Rejected => bail!("A turn is already in progress"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_options_have_no_tools() {
        let options = outline_options(&AppSettings::default()).unwrap();
        assert!(options.allowed_tools.is_empty());
        assert!(options.mcp_servers.is_empty());
        assert_eq!(options.system_prompt.as_deref(), Some(OUTLINE_SYSTEM_PROMPT));
    }
}
