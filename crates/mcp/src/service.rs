//! Server endpoint of the session transport.
//!
//! Serves newline-framed JSON-RPC over the process's own stdin/stdout. Tool
//! handlers get a [`Peer`] handle through which they can reach back to the
//! connected client, notably to ask for its declared root directories.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Value, json};
use tokio::io::{AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::client::{DEFAULT_TIMEOUT, read_frame_line};
use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, ClientCapabilities, Frame, InitializeParams, InitializeResult,
    JsonRpcRequest, JsonRpcResponse, ListRootsResult, ListToolsResult, PROTOCOL_VERSION,
    RequestId, Root, ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};

/// The tool surface a server exposes.
pub trait ToolHandler: Send + Sync {
    /// The tool catalog, re-declared on every `tools/list`.
    fn tools(&self) -> Vec<Tool>;

    /// Execute one tool call. Failures are reported as `is_error` payloads
    /// so a failed invocation never takes the session down.
    fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
        peer: &Peer,
    ) -> impl Future<Output = CallToolResult> + Send;
}

/// Handle to the connected client, shared with tool handlers.
///
/// Holds the session's view of the client: its declared capabilities and the
/// wire halves needed to issue server-initiated requests. One session per
/// process over stdio, but all session state lives here rather than in a
/// process global, so multiple sessions can coexist if a transport ever
/// carries more than one.
#[derive(Clone)]
pub struct Peer {
    reader: Arc<Mutex<BufReader<Stdin>>>,
    writer: Arc<Mutex<Stdout>>,
    next_id: Arc<AtomicI64>,
    capabilities: Arc<Mutex<Option<ClientCapabilities>>>,
}

impl Peer {
    fn new() -> Self {
        Self {
            reader: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()))),
            writer: Arc::new(Mutex::new(tokio::io::stdout())),
            next_id: Arc::new(AtomicI64::new(1)),
            capabilities: Arc::new(Mutex::new(None)),
        }
    }

    async fn set_capabilities(&self, capabilities: ClientCapabilities) {
        *self.capabilities.lock().await = Some(capabilities);
    }

    /// Whether the connected client declared the roots capability during
    /// initialization.
    pub async fn supports_roots(&self) -> bool {
        self.capabilities
            .lock()
            .await
            .as_ref()
            .is_some_and(|c| c.roots.is_some())
    }

    /// Ask the client for its root list.
    ///
    /// Capability-gated; callers check [`supports_roots`](Self::supports_roots)
    /// first. The request goes out mid tool-call, so frames are read here
    /// until the matching response arrives.
    pub async fn list_roots(&self) -> Result<Vec<Root>> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = JsonRpcRequest::new(id.clone(), "roots/list");
        self.write_frame(&serde_json::to_value(&request)?).await?;

        let response = timeout(DEFAULT_TIMEOUT, self.read_response(&id))
            .await
            .map_err(|_| Error::Timeout)??;

        let result: ListRootsResult = serde_json::from_value(response.into_result()?)?;
        Ok(result.roots)
    }

    async fn read_response(&self, id: &RequestId) -> Result<JsonRpcResponse> {
        loop {
            let line = {
                let mut reader = self.reader.lock().await;
                read_frame_line(&mut *reader).await?
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
                Frame::Notification { method } => {
                    tracing::debug!(%method, "ignoring notification");
                }
                Frame::Request {
                    id: peer_id,
                    method,
                    ..
                } => {
                    // The client drives requests sequentially; one arriving
                    // while we await a response is out of order.
                    let frame = error_frame(
                        Some(peer_id),
                        -32601,
                        &format!("method not available: {method}"),
                    );
                    self.write_frame(&frame).await?;
                }
            }
        }
    }

    async fn write_frame(&self, frame: &Value) -> Result<()> {
        let frame_json = serde_json::to_string(frame)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(frame_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Serve a tool handler over stdio until the client hangs up.
pub async fn serve_stdio<H: ToolHandler>(name: &str, handler: H) -> Result<()> {
    let peer = Peer::new();
    tracing::info!(server = name, "serving over stdio");

    loop {
        let line = {
            let mut reader = peer.reader.lock().await;
            match read_frame_line(&mut *reader).await {
                Ok(line) => line,
                Err(Error::PeerGone) => return Ok(()),
                Err(e) => return Err(e),
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let frame = match Frame::parse(&line) {
            Ok(frame) => frame,
            Err(e) => {
                let reply = error_frame(None, -32700, &format!("parse error: {e}"));
                peer.write_frame(&reply).await?;
                continue;
            }
        };

        match frame {
            Frame::Notification { method } => {
                tracing::debug!(%method, "notification");
            }
            Frame::Response(response) => {
                tracing::warn!(id = ?response.id, "unexpected response frame");
            }
            Frame::Request { id, method, params } => {
                let reply = handle_request(name, &handler, &peer, id, &method, params).await?;
                peer.write_frame(&reply).await?;
            }
        }
    }
}

async fn handle_request<H: ToolHandler>(
    name: &str,
    handler: &H,
    peer: &Peer,
    id: RequestId,
    method: &str,
    params: Option<Value>,
) -> Result<Value> {
    let frame = match method {
        "initialize" => {
            let capabilities = params
                .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok())
                .map(|p| p.capabilities)
                .unwrap_or_default();
            peer.set_capabilities(capabilities).await;

            let result = InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability::default()),
                },
                server_info: ServerInfo {
                    name: name.to_string(),
                    version: Some(env!("CARGO_PKG_VERSION").to_string()),
                },
            };
            result_frame(id, serde_json::to_value(result)?)
        }
        "tools/list" => {
            let result = ListToolsResult {
                tools: handler.tools(),
            };
            result_frame(id, serde_json::to_value(result)?)
        }
        "tools/call" => match params.and_then(|p| serde_json::from_value::<CallToolParams>(p).ok())
        {
            Some(call) => {
                let result = handler.call_tool(&call.name, call.arguments, peer).await;
                result_frame(id, serde_json::to_value(result)?)
            }
            None => error_frame(Some(id), -32602, "invalid tool call params"),
        },
        "ping" => result_frame(id, json!({})),
        _ => error_frame(Some(id), -32601, &format!("method not found: {method}")),
    };
    Ok(frame)
}

fn result_frame(id: RequestId, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_frame(id: Option<RequestId>, code: i32, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
