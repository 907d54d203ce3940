//! Transport over the agent CLI subprocess speaking stream-json on stdin/stdout

use super::protocol::{CliMessage, ControlRequestBody, OutgoingMessage, TurnDecoder};
use super::{Connector, StreamItem, Transport, TransportResult, CLI_CANDIDATES};
use crate::config::AgentOptions;
use crate::error::TransportError;
use crate::hooks::HookRegistry;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// How long a graceful shutdown may take before the process is killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Stdin of the CLI, shared between `submit` and the control-request responder.
/// `None` once the transport has been disconnected.
type SharedWriter = Arc<Mutex<Option<BufWriter<ChildStdin>>>>;

/// Connects by spawning a new agent CLI process per transport
#[derive(Debug, Default, Clone)]
pub struct CliConnector;

#[async_trait]
impl Connector for CliConnector {
    async fn connect(&self, options: &AgentOptions) -> TransportResult<Box<dyn Transport>> {
        let transport = CliTransport::spawn(options).await?;
        Ok(Box::new(transport))
    }
}

/// Command-line arguments for a streaming CLI session
pub fn build_args(options: &AgentOptions) -> Vec<String> {
    let mut args: Vec<String> = ["--output-format", "stream-json", "--verbose"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    if let Some(prompt) = &options.system_prompt {
        args.push("--system-prompt".to_string());
        args.push(prompt.clone());
    }

    if !options.allowed_tools.is_empty() {
        args.push("--allowedTools".to_string());
        args.push(options.allowed_tools.join(","));
    }

    if let Some(model) = &options.model {
        args.push("--model".to_string());
        args.push(model.clone());
    }

    if let Some(mode) = options.permission_mode {
        args.push("--permission-mode".to_string());
        args.push(mode.as_str().to_string());
    }

    if let Some(mcp_config) = options.mcp_config_json() {
        args.push("--mcp-config".to_string());
        args.push(mcp_config);
    }

    args.push("--setting-sources".to_string());
    args.push(
        options
            .setting_sources
            .as_ref()
            .map(|sources| sources.join(","))
            .unwrap_or_default(),
    );

    args.push("--input-format".to_string());
    args.push("stream-json".to_string());

    args
}

/// Find the executable to spawn, without probing it
fn locate_cli(options: &AgentOptions) -> TransportResult<PathBuf> {
    if let Some(path) = &options.cli_path {
        return Ok(path.clone());
    }

    CLI_CANDIDATES
        .iter()
        .find_map(|candidate| which::which(candidate).ok())
        .ok_or_else(|| TransportError::CliNotFound {
            searched: CLI_CANDIDATES.join(", "),
        })
}

/// A running agent CLI process
pub struct CliTransport {
    child: Child,
    writer: SharedWriter,
    messages: mpsc::UnboundedReceiver<Result<CliMessage, String>>,
    decoder: TurnDecoder,
    pending: VecDeque<StreamItem>,
    reader: JoinHandle<()>,
    stderr: JoinHandle<()>,
}

impl CliTransport {
    /// Spawn the CLI and send the `initialize` control request
    pub async fn spawn(options: &AgentOptions) -> TransportResult<Self> {
        let program = locate_cli(options)?;
        let args = build_args(options);
        debug!("Spawning agent CLI: {} {:?}", program.display(), args);

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .env("CLAUDE_CODE_ENTRYPOINT", "sdk-rs")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TransportError::CliNotFound {
                searched: program.display().to_string(),
            },
            _ => TransportError::Connect {
                message: format!("failed to start {}: {}", program.display(), e),
            },
        })?;

        let (stdin, stdout, stderr) = match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            _ => {
                return Err(TransportError::Connect {
                    message: "agent CLI pipes unavailable".to_string(),
                })
            }
        };

        let writer: SharedWriter = Arc::new(Mutex::new(Some(BufWriter::new(stdin))));
        let (tx, rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(
            stdout,
            tx,
            Arc::clone(&writer),
            options.hooks.clone(),
        ));

        let stderr = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("[agent stderr] {}", line);
            }
        });

        let transport = Self {
            child,
            writer,
            messages: rx,
            decoder: TurnDecoder::new(),
            pending: VecDeque::new(),
            reader,
            stderr,
        };

        let request_id = format!("req_1_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
        let initialize = OutgoingMessage::control_request(
            request_id,
            json!({
                "subtype": "initialize",
                "hooks": options.hooks.initialize_payload(),
            }),
        );
        let line = initialize
            .to_line()
            .map_err(|e| TransportError::other(e.to_string()))?;
        write_line(&transport.writer, &line)
            .await
            .map_err(|e| TransportError::Connect {
                message: format!("failed to initialize agent CLI: {}", e),
            })?;

        Ok(transport)
    }

    fn ended_message(&mut self) -> String {
        match self.child.try_wait() {
            Ok(Some(status)) => format!("agent process exited ({}) before the end of the turn", status),
            _ => "agent output closed before the end of the turn".to_string(),
        }
    }
}

#[async_trait]
impl Transport for CliTransport {
    async fn submit(&mut self, prompt: &str) -> TransportResult<()> {
        if let Ok(Some(status)) = self.child.try_wait() {
            return Err(TransportError::connection_broken(format!(
                "agent process exited ({})",
                status
            )));
        }

        // A stopped reader would hand the next turn a stale error
        if self.reader.is_finished() {
            return Err(TransportError::connection_broken(
                "agent output reader has stopped",
            ));
        }

        self.pending.clear();
        self.decoder = TurnDecoder::new();

        let line = OutgoingMessage::user_prompt(prompt)
            .to_line()
            .map_err(|e| TransportError::other(e.to_string()))?;

        write_line(&self.writer, &line)
            .await
            .map_err(|e| TransportError::connection_broken(e.to_string()))
    }

    async fn next_fragment(&mut self) -> TransportResult<StreamItem> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Ok(item);
            }

            match self.messages.recv().await {
                Some(Ok(message)) => {
                    let items = self.decoder.decode(message);
                    self.pending.extend(items);
                }
                Some(Err(message)) => return Err(TransportError::stream(message)),
                None => return Err(TransportError::stream(self.ended_message())),
            }
        }
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        // Dropping stdin lets the CLI exit on its own
        self.writer.lock().await.take();

        let result = match timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Agent process exited ({})", status);
                Ok(())
            }
            Ok(Err(e)) => Err(TransportError::other(e.to_string())),
            Err(_) => {
                warn!("Agent process did not exit in time, killing it");
                self.child
                    .kill()
                    .await
                    .map_err(|e| TransportError::other(e.to_string()))
            }
        };

        self.reader.abort();
        self.stderr.abort();
        result
    }
}

impl Drop for CliTransport {
    fn drop(&mut self) {
        self.reader.abort();
        self.stderr.abort();
    }
}

async fn write_line(writer: &SharedWriter, line: &str) -> io::Result<()> {
    let mut guard = writer.lock().await;
    let writer = guard
        .as_mut()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "agent stdin is closed"))?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Forward stdout messages to the transport, answering control requests inline
async fn read_loop(
    stdout: ChildStdout,
    tx: mpsc::UnboundedSender<Result<CliMessage, String>>,
    writer: SharedWriter,
    hooks: HookRegistry,
) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                let _ = tx.send(Err(format!("failed to read agent output: {}", e)));
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match CliMessage::parse_line(line) {
            Ok(CliMessage::ControlRequest {
                request_id,
                request,
            }) => {
                let reply = answer_control_request(&hooks, &request_id, request).await;
                match reply.to_line() {
                    Ok(reply) => {
                        if let Err(e) = write_line(&writer, &reply).await {
                            warn!("Failed to answer control request {}: {}", request_id, e);
                        }
                    }
                    Err(e) => warn!("Failed to encode control response: {}", e),
                }
            }
            Ok(CliMessage::ControlResponse { response }) => {
                debug!("Control response: {}", response);
            }
            Ok(message) => {
                if tx.send(Ok(message)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(format!("undecodable message from agent: {}", e)));
                break;
            }
        }
    }
}

async fn answer_control_request(
    hooks: &HookRegistry,
    request_id: &str,
    request: Value,
) -> OutgoingMessage {
    let body = serde_json::from_value::<ControlRequestBody>(request)
        .unwrap_or(ControlRequestBody::Unsupported);

    match body {
        ControlRequestBody::HookCallback {
            callback_id,
            input,
            tool_use_id,
        } => match hooks
            .dispatch(&callback_id, &input, tool_use_id.as_deref())
            .await
        {
            Some(output) => OutgoingMessage::control_success(request_id, output),
            None => OutgoingMessage::control_error(
                request_id,
                &format!("no hook registered for callback {}", callback_id),
            ),
        },
        ControlRequestBody::CanUseTool { tool_name, input } => {
            debug!("Allowing tool {}", tool_name);
            OutgoingMessage::control_success(
                request_id,
                json!({ "behavior": "allow", "updatedInput": input }),
            )
        }
        ControlRequestBody::Unsupported => {
            OutgoingMessage::control_error(request_id, "unsupported control request")
        }
    }
}
