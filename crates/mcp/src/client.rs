//! Client endpoint of the session transport.
//!
//! Spawns a tool server as a child process and drives it over stdio. While a
//! response is pending, server-initiated requests (`roots/list`) are answered
//! inline from the root set the client was constructed with.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, ClientCapabilities, ClientInfo, Frame, InitializeParams,
    InitializeResult, JsonRpcRequest, JsonRpcResponse, ListRootsResult, ListToolsResult,
    PROTOCOL_VERSION, RequestId, Root, RootsCapability, Tool,
};

/// Default timeout for transport operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum frame size (1MB).
/// Sized for large tool outputs (schemas, wide column lists).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Read one newline-terminated frame, enforcing the size bound.
pub(crate) async fn read_frame_line<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Err(Error::PeerGone);
    }
    if line.len() > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge {
            size: line.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(line)
}

/// Configuration for a tool server to spawn.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// Handle to a running tool server.
pub struct Client {
    // Held for its lifetime only: kill_on_drop reaps the child when the
    // handle goes away.
    _process: Child,
    stdin: Mutex<tokio::process::ChildStdin>,
    stdout: Mutex<BufReader<tokio::process::ChildStdout>>,
    next_id: AtomicI64,
    initialized: Mutex<bool>,
    roots: Vec<Root>,
}

impl Client {
    /// Spawn the server process and wire up its pipes.
    ///
    /// `roots` is the set of directories this client is willing to expose;
    /// when non-empty, the roots capability is declared during
    /// initialization and `roots/list` requests are answered from it.
    pub async fn spawn(config: ServerConfig, roots: Vec<Root>) -> Result<Self> {
        tracing::debug!(server = %config.name, command = %config.command, "spawning tool server");
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut process = cmd.spawn().map_err(Error::Spawn)?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdin")))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdout")))?;

        Ok(Self {
            _process: process,
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicI64::new(1),
            initialized: Mutex::new(false),
            roots,
        })
    }

    /// Initialize the session (must be called before other operations).
    /// Returns the server's half of the handshake.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let capabilities = ClientCapabilities {
            roots: (!self.roots.is_empty()).then(RootsCapability::default),
        };
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities,
            client_info: ClientInfo {
                name: "csvchat".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        let result: InitializeResult = self.request("initialize", Some(params)).await?;
        self.notify("notifications/initialized", None::<()>).await?;

        *self.initialized.lock().await = true;

        Ok(result)
    }

    /// Fetch the live tool catalog. The result is not cached; each call
    /// reflects what the server declares right now.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        if !*self.initialized.lock().await {
            return Err(Error::NotInitialized);
        }
        let result: ListToolsResult = self.request("tools/list", None::<()>).await?;
        Ok(result.tools)
    }

    /// Call a tool by name.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        if !*self.initialized.lock().await {
            return Err(Error::NotInitialized);
        }

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let result: CallToolResult = self.request("tools/call", Some(params)).await?;

        if result.is_error {
            let error_text = result
                .content
                .iter()
                .filter_map(|c| c.as_text())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(Error::ToolCallFailed(error_text));
        }

        Ok(result)
    }

    // --- Internal methods ---

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        self.write_frame(&serde_json::to_value(&request)?).await?;

        let response = timeout(DEFAULT_TIMEOUT, self.read_response(&id))
            .await
            .map_err(|_| Error::Timeout)??;

        let result_value = response.into_result()?;
        let result: R = serde_json::from_value(result_value)?;

        Ok(result)
    }

    async fn notify<P>(&self, method: &str, params: Option<P>) -> Result<()>
    where
        P: serde::Serialize,
    {
        // Notifications have no ID
        let notification = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params.and_then(|p| serde_json::to_value(p).ok())
        });
        self.write_frame(&notification).await
    }

    /// Read frames until the response for `id` arrives, serving any
    /// server-initiated requests encountered along the way.
    async fn read_response(&self, id: &RequestId) -> Result<JsonRpcResponse> {
        loop {
            let line = {
                let mut stdout = self.stdout.lock().await;
                read_frame_line(&mut *stdout).await?
            };

            match Frame::parse(&line)? {
                Frame::Response(response) => {
                    if response.id != *id {
                        return Err(Error::InvalidResponse(format!(
                            "response ID mismatch: expected {id:?}, got {:?}",
                            response.id
                        )));
                    }
                    return Ok(response);
                }
                Frame::Request {
                    id: peer_id,
                    method,
                    ..
                } => self.answer_peer_request(peer_id, &method).await?,
                Frame::Notification { method } => {
                    tracing::debug!(%method, "ignoring notification");
                }
            }
        }
    }

    async fn answer_peer_request(&self, id: RequestId, method: &str) -> Result<()> {
        match method {
            "roots/list" => {
                let result = ListRootsResult {
                    roots: self.roots.clone(),
                };
                let frame = json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": serde_json::to_value(result)?
                });
                self.write_frame(&frame).await
            }
            _ => {
                let frame = json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32601, "message": format!("method not found: {method}") }
                });
                self.write_frame(&frame).await
            }
        }
    }

    async fn write_frame(&self, frame: &Value) -> Result<()> {
        let frame_json = serde_json::to_string(frame)?;
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(frame_json.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }
}
