//! Built-in hooks

use super::{Hook, HookEvent};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

/// Commands that are never allowed to run through the Bash tool
const DANGEROUS_PATTERNS: &[&str] = &["rm -rf /", "format c:"];

/// Logs every tool use it sees
pub struct ToolLogHook {
    event: HookEvent,
}

impl ToolLogHook {
    pub fn new(event: HookEvent) -> Self {
        Self { event }
    }
}

#[async_trait]
impl Hook for ToolLogHook {
    fn name(&self) -> &str {
        match self.event {
            HookEvent::PreToolUse => "pre_tool_log",
            HookEvent::PostToolUse => "post_tool_log",
        }
    }

    async fn call(&self, input: &Value, _tool_use_id: Option<&str>) -> Value {
        let tool = input.get("tool_name").and_then(Value::as_str).unwrap_or("?");
        match self.event {
            HookEvent::PreToolUse => {
                let tool_input = input.get("tool_input").cloned().unwrap_or(Value::Null);
                info!("[PRE] tool={} input={}", tool, tool_input);
            }
            HookEvent::PostToolUse => info!("[POST] tool={}", tool),
        }
        json!({})
    }
}

/// Denies Bash commands containing a dangerous pattern
pub struct DangerousCommandGuard {
    patterns: Vec<String>,
}

impl DangerousCommandGuard {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Whether `command` would be blocked
    pub fn is_dangerous(&self, command: &str) -> bool {
        let command = command.trim().to_lowercase();
        self.patterns.iter().any(|p| command.contains(p.as_str()))
    }
}

impl Default for DangerousCommandGuard {
    fn default() -> Self {
        Self::new(DANGEROUS_PATTERNS.iter().map(|p| p.to_string()).collect())
    }
}

#[async_trait]
impl Hook for DangerousCommandGuard {
    fn name(&self) -> &str {
        "dangerous_command_guard"
    }

    async fn call(&self, input: &Value, _tool_use_id: Option<&str>) -> Value {
        if input.get("tool_name").and_then(Value::as_str) != Some("Bash") {
            return json!({});
        }

        let command = input
            .get("tool_input")
            .and_then(|i| i.get("command"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        if !self.is_dangerous(command) {
            return json!({});
        }

        tracing::warn!("Blocked dangerous command: {}", command);
        json!({
            "hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "deny",
                "permissionDecisionReason": "Dangerous command blocked"
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_patterns_are_case_insensitive() {
        let guard = DangerousCommandGuard::default();
        assert!(guard.is_dangerous("  RM -RF /tmp/../"));
        assert!(guard.is_dangerous("Format C: /q"));
        assert!(!guard.is_dangerous("rm -rf ./target"));
        assert!(!guard.is_dangerous("ls -la"));
    }

    #[tokio::test]
    async fn test_guard_ignores_other_tools() {
        let guard = DangerousCommandGuard::default();
        let input = json!({"tool_name": "Write", "tool_input": {"command": "rm -rf /"}});
        assert_eq!(guard.call(&input, None).await, json!({}));
    }

    #[tokio::test]
    async fn test_guard_denies_dangerous_bash() {
        let guard = DangerousCommandGuard::default();
        let input = json!({"tool_name": "Bash", "tool_input": {"command": "sudo rm -rf /"}});
        let output = guard.call(&input, Some("toolu_1")).await;
        assert_eq!(
            output["hookSpecificOutput"]["permissionDecisionReason"],
            "Dangerous command blocked"
        );
        assert_eq!(output["hookSpecificOutput"]["hookEventName"], "PreToolUse");
    }
}
