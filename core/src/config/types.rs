//! Configuration types for tether core
//!
//! Core only accepts fully resolved configuration. The agent options built here are
//! opaque to the resilient client and are passed unchanged to every reconnect.

use crate::error::ConfigError;
use crate::hooks::HookRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Permission mode used when none is configured
pub const DEFAULT_PERMISSION_MODE: PermissionMode = PermissionMode::AcceptEdits;

/// Permission mode passed to the agent CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Ask for every sensitive tool call
    Default,
    /// Accept file edits without asking
    AcceptEdits,
    /// Plan only, no execution
    Plan,
    /// Skip all permission prompts
    BypassPermissions,
}

impl PermissionMode {
    /// Get the mode name as the CLI expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::Plan => "plan",
            PermissionMode::BypassPermissions => "bypassPermissions",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(PermissionMode::Default),
            "acceptEdits" => Ok(PermissionMode::AcceptEdits),
            "plan" => Ok(PermissionMode::Plan),
            "bypassPermissions" => Ok(PermissionMode::BypassPermissions),
            other => Err(ConfigError::InvalidValue {
                field: "permission_mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// A stdio MCP server the agent CLI should launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerSpec {
    /// Executable to launch
    pub command: String,
    /// Arguments for the executable
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment for the server process
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl McpServerSpec {
    pub fn new<S: Into<String>>(command: S, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: HashMap::new(),
        }
    }

    /// Entry for the `mcpServers` map of `--mcp-config`
    pub fn to_config_entry(&self) -> serde_json::Value {
        let mut entry = serde_json::json!({
            "type": "stdio",
            "command": self.command,
            "args": self.args,
        });
        if !self.env.is_empty() {
            entry["env"] = serde_json::json!(self.env);
        }
        entry
    }
}

/// Everything needed to (re)connect to the agent runtime
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    /// Model alias or identifier (e.g. "sonnet")
    pub model: Option<String>,
    /// Permission mode for tool use
    pub permission_mode: Option<PermissionMode>,
    /// Working directory of the agent process
    pub cwd: Option<PathBuf>,
    /// System prompt replacing the default one
    pub system_prompt: Option<String>,
    /// Tools the agent may call without asking
    pub allowed_tools: Vec<String>,
    /// MCP servers keyed by alias
    pub mcp_servers: BTreeMap<String, McpServerSpec>,
    /// Filesystem setting sources; `None` means none are loaded
    pub setting_sources: Option<Vec<String>>,
    /// Explicit path to the agent CLI executable
    pub cli_path: Option<PathBuf>,
    /// Tool-use hooks answered over the control protocol
    pub hooks: HookRegistry,
}

impl AgentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_permission_mode(mut self, mode: Option<PermissionMode>) -> Self {
        self.permission_mode = mode;
        self
    }

    pub fn with_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Append tools to the allow list
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn with_mcp_server<S: Into<String>>(mut self, alias: S, spec: McpServerSpec) -> Self {
        self.mcp_servers.insert(alias.into(), spec);
        self
    }

    pub fn with_cli_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_path = path;
        self
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// JSON for `--mcp-config`, or `None` when no servers are configured
    pub fn mcp_config_json(&self) -> Option<String> {
        if self.mcp_servers.is_empty() {
            return None;
        }
        let servers: serde_json::Map<String, serde_json::Value> = self
            .mcp_servers
            .iter()
            .map(|(alias, spec)| (alias.clone(), spec.to_config_entry()))
            .collect();
        Some(serde_json::json!({ "mcpServers": servers }).to_string())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "model".to_string(),
                    value: model.clone(),
                });
            }
        }

        if let Some(cwd) = &self.cwd {
            if !cwd.is_dir() {
                return Err(ConfigError::DirectoryNotFound {
                    path: cwd.display().to_string(),
                });
            }
        }

        if let Some(tool) = self.allowed_tools.iter().find(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "allowed_tools".to_string(),
                value: tool.clone(),
            });
        }

        for alias in self.mcp_servers.keys() {
            let valid = !alias.is_empty()
                && alias
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(ConfigError::InvalidValue {
                    field: "mcp_servers".to_string(),
                    value: alias.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Application-level settings resolved by the CLI loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Model override; each application falls back to its own default
    pub model: Option<String>,
    /// Permission mode for tool use
    pub permission_mode: Option<PermissionMode>,
    /// Working directory for the agent process
    pub cwd: Option<PathBuf>,
    /// Explicit agent CLI path
    pub cli_path: Option<PathBuf>,
    /// Directory where notes are stored
    pub notes_dir: Option<PathBuf>,
}

impl AppSettings {
    /// Build agent options, using `default_model` when no model is configured.
    ///
    /// No filesystem setting sources are loaded; everything is programmatic.
    pub fn make_options(&self, default_model: &str) -> AgentOptions {
        AgentOptions::new()
            .with_model(
                self.model
                    .clone()
                    .unwrap_or_else(|| default_model.to_string()),
            )
            .with_permission_mode(self.permission_mode)
            .with_cwd(self.cwd.clone())
            .with_cli_path(self.cli_path.clone())
    }

    /// Notes directory, defaulting to `./notes`
    pub fn notes_dir(&self) -> PathBuf {
        self.notes_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("notes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_mode_round_trip_names() {
        for mode in [
            PermissionMode::Default,
            PermissionMode::AcceptEdits,
            PermissionMode::Plan,
            PermissionMode::BypassPermissions,
        ] {
            assert_eq!(mode.as_str().parse::<PermissionMode>().unwrap(), mode);
        }
        assert!("acceptedits".parse::<PermissionMode>().is_err());
    }

    #[test]
    fn test_make_options_prefers_configured_model() {
        let settings = AppSettings {
            model: Some("opus".to_string()),
            permission_mode: Some(PermissionMode::AcceptEdits),
            ..Default::default()
        };
        let options = settings.make_options("sonnet");
        assert_eq!(options.model.as_deref(), Some("opus"));
        assert_eq!(options.permission_mode, Some(PermissionMode::AcceptEdits));
        assert!(options.setting_sources.is_none());

        let options = AppSettings::default().make_options("sonnet");
        assert_eq!(options.model.as_deref(), Some("sonnet"));
    }

    #[test]
    fn test_mcp_config_json() {
        let options = AgentOptions::new().with_mcp_server(
            "utils",
            McpServerSpec::new("/bin/tether", vec!["mcp".into(), "utilities".into()]),
        );
        let json: serde_json::Value =
            serde_json::from_str(&options.mcp_config_json().unwrap()).unwrap();
        assert_eq!(json["mcpServers"]["utils"]["command"], "/bin/tether");
        assert_eq!(json["mcpServers"]["utils"]["args"][1], "utilities");
        assert!(json["mcpServers"]["utils"].get("env").is_none());

        assert!(AgentOptions::new().mcp_config_json().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AgentOptions::new().with_model("sonnet").validate().is_ok());
        assert!(AgentOptions::new().with_model("  ").validate().is_err());
        assert!(AgentOptions::new()
            .with_cwd(Some(PathBuf::from("/definitely/not/here")))
            .validate()
            .is_err());
        assert!(AgentOptions::new()
            .with_mcp_server("bad alias", McpServerSpec::new("x", vec![]))
            .validate()
            .is_err());
    }
}
