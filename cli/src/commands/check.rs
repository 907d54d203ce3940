//! Agent CLI preflight check

use super::preflight;
use crate::config::CliConfigLoader;
use anyhow::Result;
use console::style;

/// Verify the agent CLI can be found and reports a version
pub async fn check_command(loader: CliConfigLoader) -> Result<()> {
    let settings = loader.load().await?;
    let cli = preflight(&settings).await?;

    println!("{} {} {}", style("✅").green(), cli.command, cli.version);
    println!("   {}", style(cli.path.display()).dim());
    Ok(())
}
