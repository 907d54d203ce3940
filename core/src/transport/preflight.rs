//! Locate a usable agent CLI before connecting

use super::TransportResult;
use crate::error::TransportError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Executable names tried in order
pub const CLI_CANDIDATES: &[&str] = &["claude", "claude-code"];

const VERSION_TIMEOUT: Duration = Duration::from_secs(15);

/// A verified agent CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliInfo {
    /// Name it was found under
    pub command: String,
    /// Resolved executable path
    pub path: PathBuf,
    /// Output of `--version`
    pub version: String,
}

/// Resolve the agent CLI: `explicit` if given, otherwise the first candidate on
/// `PATH` that answers `--version`.
pub async fn resolve_cli(explicit: Option<&Path>) -> TransportResult<CliInfo> {
    if let Some(path) = explicit {
        return match query_version(path).await {
            Some(version) => Ok(CliInfo {
                command: path.display().to_string(),
                path: path.to_path_buf(),
                version,
            }),
            None => Err(TransportError::CliNotFound {
                searched: path.display().to_string(),
            }),
        };
    }

    for candidate in CLI_CANDIDATES {
        let Ok(path) = which::which(candidate) else {
            debug!("{} not found on PATH", candidate);
            continue;
        };

        // Found on PATH but not runnable: try the next candidate
        if let Some(version) = query_version(&path).await {
            return Ok(CliInfo {
                command: candidate.to_string(),
                path,
                version,
            });
        }
    }

    Err(TransportError::CliNotFound {
        searched: CLI_CANDIDATES.join(", "),
    })
}

/// Run `<path> --version`, returning its trimmed output on success
async fn query_version(path: &Path) -> Option<String> {
    let output = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    match timeout(VERSION_TIMEOUT, output).await {
        Ok(Ok(output)) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if stdout.is_empty() {
                Some(String::from_utf8_lossy(&output.stderr).trim().to_string())
            } else {
                Some(stdout)
            }
        }
        Ok(Ok(output)) => {
            debug!("{} --version exited with {}", path.display(), output.status);
            None
        }
        Ok(Err(e)) => {
            debug!("{} --version failed: {}", path.display(), e);
            None
        }
        Err(_) => {
            debug!("{} --version timed out", path.display());
            None
        }
    }
}
