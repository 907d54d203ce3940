//! Tool-use hooks answered over the agent CLI control protocol
//!
//! Hooks are registered per event with an optional tool-name matcher. The CLI does
//! the matching; on a hit it sends a `hook_callback` control request carrying the
//! callback id assigned here, and the hook's JSON output is sent back verbatim.

pub mod builtin;

pub use builtin::{DangerousCommandGuard, ToolLogHook};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Hook events supported by the agent CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
        }
    }
}

/// A callback invoked by the agent CLI around tool use
#[async_trait]
pub trait Hook: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Handle the hook input; an empty object means "no opinion"
    async fn call(&self, input: &Value, tool_use_id: Option<&str>) -> Value;
}

/// Hooks that fire for tools matching `matcher` (all tools when `None`)
#[derive(Clone)]
pub struct HookMatcher {
    pub matcher: Option<String>,
    pub hooks: Vec<Arc<dyn Hook>>,
}

impl HookMatcher {
    pub fn all(hooks: Vec<Arc<dyn Hook>>) -> Self {
        Self {
            matcher: None,
            hooks,
        }
    }

    pub fn tool<S: Into<String>>(tool: S, hooks: Vec<Arc<dyn Hook>>) -> Self {
        Self {
            matcher: Some(tool.into()),
            hooks,
        }
    }
}

/// Registered hooks, keyed by event
#[derive(Clone, Default)]
pub struct HookRegistry {
    entries: BTreeMap<HookEvent, Vec<HookMatcher>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a matcher for an event
    pub fn with_matcher(mut self, event: HookEvent, matcher: HookMatcher) -> Self {
        self.entries.entry(event).or_default().push(matcher);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|m| m.iter().all(|m| m.hooks.is_empty()))
    }

    /// Every hook with its callback id, in a stable order
    fn numbered(&self) -> impl Iterator<Item = (String, HookEvent, &HookMatcher, &Arc<dyn Hook>)> {
        self.entries
            .iter()
            .flat_map(|(event, matchers)| {
                matchers
                    .iter()
                    .flat_map(move |m| m.hooks.iter().map(move |h| (*event, m, h)))
            })
            .enumerate()
            .map(|(n, (event, matcher, hook))| (format!("hook_{}", n), event, matcher, hook))
    }

    /// The `hooks` field of the `initialize` control request
    pub fn initialize_payload(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }

        let mut payload = serde_json::Map::new();
        for (event, matchers) in &self.entries {
            let mut entries = Vec::new();
            for matcher in matchers {
                let ids: Vec<String> = self
                    .numbered()
                    .filter(|(_, e, m, _)| e == event && std::ptr::eq(*m, matcher))
                    .map(|(id, ..)| id)
                    .collect();
                if ids.is_empty() {
                    continue;
                }
                entries.push(serde_json::json!({
                    "matcher": matcher.matcher,
                    "hookCallbackIds": ids,
                }));
            }
            payload.insert(event.as_str().to_string(), Value::Array(entries));
        }
        Some(Value::Object(payload))
    }

    /// Run the hook registered under `callback_id`
    pub async fn dispatch(
        &self,
        callback_id: &str,
        input: &Value,
        tool_use_id: Option<&str>,
    ) -> Option<Value> {
        let hook = self
            .numbered()
            .find(|(id, ..)| id == callback_id)
            .map(|(_, _, _, hook)| Arc::clone(hook))?;
        tracing::debug!("Dispatching hook {} ({})", callback_id, hook.name());
        Some(hook.call(input, tool_use_id).await)
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (event, matchers) in &self.entries {
            let names: Vec<String> = matchers
                .iter()
                .flat_map(|m| {
                    m.hooks.iter().map(move |h| match &m.matcher {
                        Some(tool) => format!("{}@{}", h.name(), tool),
                        None => h.name().to_string(),
                    })
                })
                .collect();
            map.entry(&event.as_str(), &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> HookRegistry {
        HookRegistry::new()
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
            )
    }

    #[test]
    fn test_initialize_payload_assigns_sequential_ids() {
        let payload = registry().initialize_payload().unwrap();
        assert_eq!(
            payload,
            json!({
                "PreToolUse": [
                    {"matcher": null, "hookCallbackIds": ["hook_0"]},
                    {"matcher": "Bash", "hookCallbackIds": ["hook_1"]}
                ],
                "PostToolUse": [
                    {"matcher": null, "hookCallbackIds": ["hook_2"]}
                ]
            })
        );
    }

    #[test]
    fn test_empty_registry_has_no_payload() {
        assert!(HookRegistry::new().is_empty());
        assert!(HookRegistry::new().initialize_payload().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_guard() {
        let input = json!({
            "tool_name": "Bash",
            "tool_input": {"command": "rm -rf / --no-preserve-root"}
        });
        let output = registry().dispatch("hook_1", &input, None).await.unwrap();
        assert_eq!(
            output["hookSpecificOutput"]["permissionDecision"],
            "deny"
        );

        let output = registry().dispatch("hook_0", &input, None).await.unwrap();
        assert_eq!(output, json!({}));

        assert!(registry().dispatch("hook_9", &input, None).await.is_none());
    }
}
