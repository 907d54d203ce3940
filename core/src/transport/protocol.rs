//! Stream-json message structures spoken by the agent CLI
//!
//! Every message is one JSON object per line. Incoming messages are decoded into
//! [`CliMessage`]; [`TurnDecoder`] turns them into the transport's [`StreamItem`]s.

use super::{Fragment, StreamItem, TurnSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message read from the CLI's stdout
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CliMessage {
    /// User-side message, carries tool results during a turn
    User {
        message: UserPayload,
        #[serde(default)]
        parent_tool_use_id: Option<String>,
    },

    /// Assistant message with content blocks
    Assistant {
        message: AssistantPayload,
        #[serde(default)]
        parent_tool_use_id: Option<String>,
    },

    /// System notifications (init, compaction, ...)
    System {
        #[serde(default)]
        subtype: Option<String>,
        #[serde(flatten)]
        data: serde_json::Map<String, Value>,
    },

    /// End of turn
    Result(ResultPayload),

    /// Partial-message events, only sent when explicitly requested
    StreamEvent {
        #[serde(default)]
        event: Value,
    },

    /// A request from the CLI that must be answered (hooks, permissions)
    ControlRequest { request_id: String, request: Value },

    /// Answer to one of our control requests
    ControlResponse { response: Value },

    #[serde(other)]
    Unknown,
}

impl CliMessage {
    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub content: MessageContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantPayload {
    #[serde(default)]
    pub model: Option<String>,
    pub content: Vec<ContentBlock>,
}

/// Content of a user message
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),

    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A block of content within a message
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },

    Thinking {
        thinking: String,
    },

    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },

    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Option<Value>,
        #[serde(default)]
        is_error: Option<bool>,
    },

    #[serde(other)]
    Unknown,
}

impl ContentBlock {
    fn into_fragment(self) -> Option<Fragment> {
        match self {
            ContentBlock::Text { text } => Some(Fragment::Text { text }),
            ContentBlock::ToolUse { id, name, input } => {
                Some(Fragment::ToolInvocation { id, name, input })
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => Some(Fragment::ToolResult {
                tool_use_id,
                content,
                is_error: is_error.unwrap_or(false),
            }),
            ContentBlock::Thinking { .. } | ContentBlock::Unknown => None,
        }
    }
}

/// Payload of the `result` message
#[derive(Debug, Clone, Deserialize)]
pub struct ResultPayload {
    pub subtype: String,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub usage: Option<Value>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Body of a control request sent by the CLI
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ControlRequestBody {
    HookCallback {
        callback_id: String,
        #[serde(default)]
        input: Value,
        #[serde(default)]
        tool_use_id: Option<String>,
    },

    CanUseTool {
        tool_name: String,
        #[serde(default)]
        input: Value,
    },

    #[serde(other)]
    Unsupported,
}

/// Message written to the CLI's stdin
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    User {
        message: OutgoingUserMessage,
        parent_tool_use_id: Option<String>,
        session_id: String,
    },

    ControlRequest { request_id: String, request: Value },

    ControlResponse { response: Value },
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingUserMessage {
    pub role: String,
    pub content: String,
}

impl OutgoingMessage {
    /// A user prompt for the default session
    pub fn user_prompt<S: Into<String>>(prompt: S) -> Self {
        OutgoingMessage::User {
            message: OutgoingUserMessage {
                role: "user".to_string(),
                content: prompt.into(),
            },
            parent_tool_use_id: None,
            session_id: "default".to_string(),
        }
    }

    pub fn control_request<S: Into<String>>(request_id: S, request: Value) -> Self {
        OutgoingMessage::ControlRequest {
            request_id: request_id.into(),
            request,
        }
    }

    pub fn control_success(request_id: &str, response: Value) -> Self {
        OutgoingMessage::ControlResponse {
            response: serde_json::json!({
                "subtype": "success",
                "request_id": request_id,
                "response": response,
            }),
        }
    }

    pub fn control_error(request_id: &str, error: &str) -> Self {
        OutgoingMessage::ControlResponse {
            response: serde_json::json!({
                "subtype": "error",
                "request_id": request_id,
                "error": error,
            }),
        }
    }

    /// Serialize as a single newline-terminated line
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Turns CLI messages of one turn into stream items
#[derive(Debug, Default)]
pub struct TurnDecoder {
    model: Option<String>,
}

impl TurnDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one message; control messages must be handled by the caller
    pub fn decode(&mut self, message: CliMessage) -> Vec<StreamItem> {
        match message {
            CliMessage::Assistant { message, .. } => {
                if self.model.is_none() {
                    self.model = message.model;
                }
                message
                    .content
                    .into_iter()
                    .filter_map(ContentBlock::into_fragment)
                    .map(StreamItem::Fragment)
                    .collect()
            }
            CliMessage::User { message, .. } => match message.content {
                MessageContent::Blocks(blocks) => blocks
                    .into_iter()
                    .filter(|b| matches!(b, ContentBlock::ToolResult { .. }))
                    .filter_map(ContentBlock::into_fragment)
                    .map(StreamItem::Fragment)
                    .collect(),
                MessageContent::Text(_) => Vec::new(),
            },
            CliMessage::Result(result) => {
                let summary = TurnSummary {
                    model: self.model.take(),
                    usage: result.usage,
                    total_cost_usd: result.total_cost_usd,
                    duration_ms: result.duration_ms,
                    is_error: result.is_error,
                    subtype: Some(result.subtype),
                };
                vec![StreamItem::EndOfTurn(summary)]
            }
            CliMessage::System { subtype, .. } => {
                tracing::debug!("System message: {}", subtype.as_deref().unwrap_or("?"));
                Vec::new()
            }
            CliMessage::StreamEvent { .. }
            | CliMessage::ControlRequest { .. }
            | CliMessage::ControlResponse { .. }
            | CliMessage::Unknown => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_all(lines: &[&str]) -> Vec<StreamItem> {
        let mut decoder = TurnDecoder::new();
        lines
            .iter()
            .map(|l| CliMessage::parse_line(l).unwrap())
            .flat_map(|m| decoder.decode(m))
            .collect()
    }

    #[test]
    fn test_decode_full_turn() {
        let items = decode_all(&[
            r#"{"type":"system","subtype":"init","session_id":"abc","tools":["Read"]}"#,
            r#"{"type":"assistant","message":{"model":"claude-sonnet-4-5","content":[{"type":"thinking","thinking":"hm","signature":"s"},{"type":"text","text":"Let me check."},{"type":"tool_use","id":"toolu_1","name":"mcp__utils__now","input":{}}]},"parent_tool_use_id":null}"#,
            r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"toolu_1","content":[{"type":"text","text":"2026-10-16T10:00:00"}]}]}}"#,
            r#"{"type":"assistant","message":{"model":"other","content":[{"type":"text","text":"It is 10am."}]}}"#,
            r#"{"type":"result","subtype":"success","duration_ms":1200,"is_error":false,"total_cost_usd":0.0123,"usage":{"input_tokens":10,"output_tokens":5},"result":"It is 10am.","session_id":"abc"}"#,
        ]);

        assert_eq!(items.len(), 5);
        assert_eq!(items[0], StreamItem::Fragment(Fragment::text("Let me check.")));
        assert_eq!(
            items[1],
            StreamItem::Fragment(Fragment::ToolInvocation {
                id: "toolu_1".into(),
                name: "mcp__utils__now".into(),
                input: json!({}),
            })
        );
        assert!(matches!(
            &items[2],
            StreamItem::Fragment(Fragment::ToolResult { tool_use_id, is_error: false, .. }) if tool_use_id == "toolu_1"
        ));
        assert_eq!(items[3], StreamItem::Fragment(Fragment::text("It is 10am.")));

        let StreamItem::EndOfTurn(summary) = &items[4] else {
            panic!("expected end of turn");
        };
        assert_eq!(summary.model.as_deref(), Some("claude-sonnet-4-5"));
        assert_eq!(summary.total_cost_usd, Some(0.0123));
        assert_eq!(summary.usage.as_ref().unwrap()["output_tokens"], 5);
        assert_eq!(summary.subtype.as_deref(), Some("success"));
    }

    #[test]
    fn test_model_resets_between_turns() {
        let mut decoder = TurnDecoder::new();
        let assistant = |model: &str| {
            CliMessage::parse_line(&format!(
                r#"{{"type":"assistant","message":{{"model":"{}","content":[]}}}}"#,
                model
            ))
            .unwrap()
        };
        let result =
            || CliMessage::parse_line(r#"{"type":"result","subtype":"success"}"#).unwrap();

        decoder.decode(assistant("first"));
        let end = decoder.decode(result());
        assert!(matches!(&end[0], StreamItem::EndOfTurn(s) if s.model.as_deref() == Some("first")));

        decoder.decode(assistant("second"));
        let end = decoder.decode(result());
        assert!(matches!(&end[0], StreamItem::EndOfTurn(s) if s.model.as_deref() == Some("second")));
    }

    #[test]
    fn test_unknown_types_are_tolerated() {
        let msg = CliMessage::parse_line(r#"{"type":"keep_alive"}"#).unwrap();
        assert!(matches!(msg, CliMessage::Unknown));

        let msg = CliMessage::parse_line(
            r#"{"type":"assistant","message":{"content":[{"type":"server_tool_use","id":"x"}]}}"#,
        )
        .unwrap();
        assert!(TurnDecoder::new().decode(msg).is_empty());

        assert!(CliMessage::parse_line("not json").is_err());
    }

    #[test]
    fn test_control_request_body() {
        let msg = CliMessage::parse_line(
            r#"{"type":"control_request","request_id":"r1","request":{"subtype":"hook_callback","callback_id":"hook_0","input":{"tool_name":"Bash"},"tool_use_id":"toolu_9"}}"#,
        )
        .unwrap();
        let CliMessage::ControlRequest { request_id, request } = msg else {
            panic!("expected control request");
        };
        assert_eq!(request_id, "r1");
        let body: ControlRequestBody = serde_json::from_value(request).unwrap();
        assert!(matches!(
            body,
            ControlRequestBody::HookCallback { ref callback_id, .. } if callback_id == "hook_0"
        ));

        let body: ControlRequestBody =
            serde_json::from_value(json!({"subtype": "interrupt"})).unwrap();
        assert!(matches!(body, ControlRequestBody::Unsupported));
    }

    #[test]
    fn test_outgoing_user_prompt_line() {
        let line = OutgoingMessage::user_prompt("hi").to_line().unwrap();
        assert!(line.ends_with('\n'));
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "user",
                "message": {"role": "user", "content": "hi"},
                "parent_tool_use_id": null,
                "session_id": "default"
            })
        );
    }

    #[test]
    fn test_control_responses() {
        let ok = serde_json::to_value(OutgoingMessage::control_success("r1", json!({}))).unwrap();
        assert_eq!(ok["type"], "control_response");
        assert_eq!(ok["response"]["subtype"], "success");
        assert_eq!(ok["response"]["request_id"], "r1");

        let err = serde_json::to_value(OutgoingMessage::control_error("r2", "nope")).unwrap();
        assert_eq!(err["response"]["subtype"], "error");
        assert_eq!(err["response"]["error"], "nope");
    }
}
