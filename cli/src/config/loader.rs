//! Simple CLI configuration loader for tether
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./tether.json or ./.tether/config.json
//! 3. Git repository root: <repo_root>/.tether/config.json
//! 4. XDG config: $XDG_CONFIG_HOME/tether/config.json or ~/.config/tether/config.json
//! 5. Environment variables only (no files)
//!
//! Environment variables fill whatever the file leaves unset; flags win over both.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tether_core::{AppSettings, PermissionMode};
use tracing::debug;

/// Environment variables consulted by the loader
pub const ENV_MODEL: &str = "CLAUDE_MODEL";
pub const ENV_PERMISSION_MODE: &str = "PERMISSION_MODE";
pub const ENV_CWD: &str = "CWD";
pub const ENV_CLI_PATH: &str = "TETHER_CLI_PATH";
pub const ENV_NOTES_DIR: &str = "TETHER_NOTES_DIR";

const ENV_VARS: &[&str] = &[ENV_MODEL, ENV_PERMISSION_MODE, ENV_CWD, ENV_CLI_PATH, ENV_NOTES_DIR];

/// Raw configuration file format; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    pub model: Option<String>,
    pub permission_mode: Option<String>,
    pub cwd: Option<String>,
    pub cli_path: Option<String>,
    pub notes_dir: Option<String>,
}

impl RawConfig {
    /// Fill unset fields from `other`
    fn or(self, other: RawConfig) -> RawConfig {
        RawConfig {
            model: self.model.or(other.model),
            permission_mode: self.permission_mode.or(other.permission_mode),
            cwd: self.cwd.or(other.cwd),
            cli_path: self.cli_path.or(other.cli_path),
            notes_dir: self.notes_dir.or(other.notes_dir),
        }
    }
}

/// CLI configuration loader
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    overrides: RawConfig,
    /// Snapshot of the relevant environment variables
    env: HashMap<String, String>,
    /// Directory the search starts from (defaults to the current directory)
    search_dir: Option<PathBuf>,
    /// XDG config home override
    xdg_dir: Option<PathBuf>,
}

impl CliConfigLoader {
    /// Create a new loader reading the process environment
    pub fn new() -> Self {
        let env = ENV_VARS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();

        Self {
            config_override: None,
            overrides: RawConfig::default(),
            env,
            search_dir: None,
            xdg_dir: None,
        }
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    pub fn with_model_override(mut self, model: String) -> Self {
        self.overrides.model = Some(model);
        self
    }

    pub fn with_permission_mode_override(mut self, mode: PermissionMode) -> Self {
        self.overrides.permission_mode = Some(mode.as_str().to_string());
        self
    }

    pub fn with_cwd_override(mut self, cwd: PathBuf) -> Self {
        self.overrides.cwd = Some(cwd.display().to_string());
        self
    }

    pub fn with_cli_path_override(mut self, path: PathBuf) -> Self {
        self.overrides.cli_path = Some(path.display().to_string());
        self
    }

    pub fn with_notes_dir_override(mut self, dir: PathBuf) -> Self {
        self.overrides.notes_dir = Some(dir.display().to_string());
        self
    }

    /// Replace the environment snapshot
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Search for config files starting from `dir` instead of the current directory
    pub fn with_search_dir(mut self, dir: PathBuf) -> Self {
        self.search_dir = Some(dir);
        self
    }

    pub fn with_xdg_dir(mut self, dir: PathBuf) -> Self {
        self.xdg_dir = Some(dir);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<AppSettings> {
        // Step 1: Find and load base configuration
        let file_config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            self.search_and_load().await?.unwrap_or_default()
        };

        // Step 2: Flags > file > environment
        let config = self.overrides.clone().or(file_config).or(self.env_config());

        // Step 3: Resolve to final settings
        self.resolve(config)
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<Option<RawConfig>> {
        let start = match &self.search_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        // 1. Current working directory
        for candidate in [start.join("tether.json"), start.join(".tether").join("config.json")] {
            if candidate.exists() {
                return self.load_file(&candidate).await.map(Some);
            }
        }

        // 2. Git repository root
        if let Some(git_root) = find_git_root(&start) {
            let config_path = git_root.join(".tether").join("config.json");
            if config_path.exists() {
                return self.load_file(&config_path).await.map(Some);
            }
        }

        // 3. XDG config directory
        if let Some(config_dir) = self.xdg_config_dir() {
            let config_path = config_dir.join("tether").join("config.json");
            if config_path.exists() {
                return self.load_file(&config_path).await.map(Some);
            }
        }

        // 4. Environment variables only
        debug!("No config file found, using environment only");
        Ok(None)
    }

    fn env_config(&self) -> RawConfig {
        let get = |key: &str| self.env.get(key).filter(|v| !v.is_empty()).cloned();
        RawConfig {
            model: get(ENV_MODEL),
            permission_mode: get(ENV_PERMISSION_MODE),
            cwd: get(ENV_CWD),
            cli_path: get(ENV_CLI_PATH),
            notes_dir: get(ENV_NOTES_DIR),
        }
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get XDG config directory
    fn xdg_config_dir(&self) -> Option<PathBuf> {
        self.xdg_dir.clone().or_else(|| {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(dirs::config_dir)
        })
    }

    fn resolve(&self, config: RawConfig) -> Result<AppSettings> {
        let permission_mode = config
            .permission_mode
            .as_deref()
            .map(str::parse::<PermissionMode>)
            .transpose()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        Ok(AppSettings {
            model: config.model.filter(|m| !m.trim().is_empty()),
            permission_mode,
            cwd: config.cwd.as_deref().map(expand_path).transpose()?,
            cli_path: config.cli_path.as_deref().map(expand_path).transpose()?,
            notes_dir: config.notes_dir.as_deref().map(expand_path).transpose()?,
        })
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand `~` and `$VARS` in a configured path
fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("Failed to expand path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Find git repository root
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn isolated(dir: &Path) -> CliConfigLoader {
        CliConfigLoader::new()
            .with_env(HashMap::new())
            .with_search_dir(dir.to_path_buf())
            .with_xdg_dir(dir.join("xdg"))
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_env_only() {
        let temp = TempDir::new().unwrap();
        let settings = isolated(temp.path())
            .with_env(env(&[(ENV_MODEL, "opus"), (ENV_PERMISSION_MODE, "plan")]))
            .load()
            .await
            .unwrap();

        assert_eq!(settings.model.as_deref(), Some("opus"));
        assert_eq!(settings.permission_mode, Some(PermissionMode::Plan));
        assert!(settings.cwd.is_none());
    }

    #[tokio::test]
    async fn test_file_beats_env_and_flags_beat_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("tether.json"),
            r#"{"model": "haiku", "notes_dir": "/tmp/my-notes"}"#,
        )
        .unwrap();

        let loader = isolated(temp.path())
            .with_env(env(&[(ENV_MODEL, "opus"), (ENV_CLI_PATH, "/opt/claude")]));
        let settings = loader.load().await.unwrap();
        assert_eq!(settings.model.as_deref(), Some("haiku"));
        assert_eq!(settings.cli_path, Some(PathBuf::from("/opt/claude")));
        assert_eq!(settings.notes_dir, Some(PathBuf::from("/tmp/my-notes")));

        let settings = loader
            .with_model_override("sonnet".to_string())
            .load()
            .await
            .unwrap();
        assert_eq!(settings.model.as_deref(), Some("sonnet"));
    }

    #[tokio::test]
    async fn test_dot_dir_and_xdg_locations() {
        let temp = TempDir::new().unwrap();
        let xdg = temp.path().join("xdg").join("tether");
        std::fs::create_dir_all(&xdg).unwrap();
        std::fs::write(xdg.join("config.json"), r#"{"model": "from-xdg"}"#).unwrap();

        let settings = isolated(temp.path()).load().await.unwrap();
        assert_eq!(settings.model.as_deref(), Some("from-xdg"));

        let local = temp.path().join(".tether");
        std::fs::create_dir_all(&local).unwrap();
        std::fs::write(local.join("config.json"), r#"{"model": "from-dot-dir"}"#).unwrap();

        let settings = isolated(temp.path()).load().await.unwrap();
        assert_eq!(settings.model.as_deref(), Some("from-dot-dir"));
    }

    #[tokio::test]
    async fn test_config_override_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.json"),
            r#"{"permission_mode": "bypassPermissions"}"#,
        )
        .unwrap();

        let settings = isolated(temp.path())
            .with_config_override(temp.path().to_path_buf())
            .load()
            .await
            .unwrap();
        assert_eq!(
            settings.permission_mode,
            Some(PermissionMode::BypassPermissions)
        );

        let missing = isolated(temp.path())
            .with_config_override(temp.path().join("nope.json"))
            .load()
            .await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_invalid_permission_mode_is_rejected() {
        let temp = TempDir::new().unwrap();
        let err = isolated(temp.path())
            .with_env(env(&[(ENV_PERMISSION_MODE, "yolo")]))
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("yolo"));
    }

    #[test]
    fn test_expand_path_home() {
        let expanded = expand_path("~/notes").unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("notes"));
    }
}
