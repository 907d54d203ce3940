//! Motivational quote tool

use crate::error::Result;
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolResult};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::json;

/// Quotes served by `inspire_me`, also used as the last-resort fallback
pub const QUOTES: &[&str] = &[
    "Dream big, start small — but start.",
    "Stay curious, stay humble, keep building.",
    "Every expert was once a beginner.",
    "Small wins stack into big victories.",
    "Consistency beats intensity when intensity is inconsistent.",
];

/// Pick a random quote
pub fn random_quote() -> &'static str {
    QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(QUOTES[0])
}

pub struct InspireTool;

impl InspireTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InspireTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for InspireTool {
    fn name(&self) -> &str {
        "inspire_me"
    }

    fn description(&self) -> &str {
        "Return a random motivational quote"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        Ok(ToolResult::success(call.id.as_str(), random_quote()))
    }
}

impl_tool_factory!(
    InspireToolFactory,
    InspireTool,
    "inspire_me",
    "Return a random motivational quote"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_quote_comes_from_list() {
        let result = InspireTool::new()
            .execute(ToolCall::new("inspire_me", json!({})))
            .await
            .unwrap();
        assert!(QUOTES.contains(&result.content.as_str()));
    }
}
