//! Serve a [`ToolServer`] over MCP stdio (newline-delimited JSON-RPC 2.0)

use crate::error::Result;
use crate::tools::{ToolCall, ToolExecutor, ToolServer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// MCP protocol revision answered when the client does not ask for one
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRpcRequest {
    method: String,
    #[serde(default)]
    params: Option<Value>,
    /// Absent for notifications
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error<S: Into<String>>(id: Value, code: i32, message: S) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// An MCP server answering for one tool server
pub struct McpServer {
    server: ToolServer,
    executor: ToolExecutor,
}

impl McpServer {
    pub fn new(server: ToolServer, executor: ToolExecutor) -> Self {
        Self { server, executor }
    }

    /// Handle one input line; notifications produce no response
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };

        let Some(id) = request.id else {
            debug!("Notification: {}", request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => {
                let version = request
                    .params
                    .as_ref()
                    .and_then(|p| p.get("protocolVersion"))
                    .and_then(Value::as_str)
                    .unwrap_or(PROTOCOL_VERSION);
                JsonRpcResponse::result(
                    id,
                    json!({
                        "protocolVersion": version,
                        "capabilities": {"tools": {}},
                        "serverInfo": {
                            "name": self.server.name,
                            "version": self.server.version,
                        }
                    }),
                )
            }
            "ping" => JsonRpcResponse::result(id, json!({})),
            "tools/list" => JsonRpcResponse::result(
                id,
                json!({ "tools": self.executor.definitions() }),
            ),
            "tools/call" => self.call_tool(id, request.params.unwrap_or(Value::Null)).await,
            other => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };

        Some(response)
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing tool name");
        };
        if self.executor.get_tool(name).is_none() {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Unknown tool: {}", name),
            );
        }

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));
        info!("Tool call: {} {}", name, arguments);

        let content = match self.executor.execute(ToolCall::new(name, arguments)).await {
            Ok(result) => json!({
                "content": [{"type": "text", "text": result.content}],
                "isError": !result.success,
            }),
            Err(e) => json!({
                "content": [{"type": "text", "text": format!("Error: {}", e)}],
                "isError": true,
            }),
        };
        JsonRpcResponse::result(id, content)
    }

    /// Answer requests from `reader` on `writer` until end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Serving MCP tool server '{}'", self.server.name);
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        debug!("MCP input closed");
        Ok(())
    }

    /// Serve on the process's stdin/stdout
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }
}
