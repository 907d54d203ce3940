//! Current time tool

use crate::error::Result;
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolResult};
use async_trait::async_trait;
use chrono::Local;
use serde_json::json;

pub struct NowTool;

impl NowTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NowTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for NowTool {
    fn name(&self) -> &str {
        "now"
    }

    fn description(&self) -> &str {
        "Return current timestamp"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        Ok(ToolResult::success(call.id, now))
    }
}

impl_tool_factory!(NowToolFactory, NowTool, "now", "Return current timestamp");

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_now_is_iso_timestamp() {
        let result = NowTool::new()
            .execute(ToolCall::new("now", json!({})))
            .await
            .unwrap();
        assert!(result.success);
        assert!(
            chrono::NaiveDateTime::parse_from_str(&result.content, "%Y-%m-%dT%H:%M:%S%.f").is_ok(),
            "not ISO-8601: {}",
            result.content
        );
    }
}
