//! MCP protocol types (JSON-RPC 2.0 based).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Protocol revision spoken by both endpoints.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: impl Serialize) -> Self {
        self.params = Some(serde_json::to_value(params).unwrap_or(Value::Null));
        self
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Returns the result if successful, or an error.
    ///
    /// Note: JSON-RPC 2.0 requires `result` on success, but some peers omit
    /// it for void methods. Missing result is treated as `null` rather than
    /// an error for compatibility.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(error) = self.error {
            Err(error)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code;
        let message = &self.message;
        write!(f, "[{code}] {message}")
    }
}

impl std::error::Error for JsonRpcError {}

/// Request ID (can be string or number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// An incoming wire frame, classified.
///
/// Both endpoints receive peer-initiated requests while waiting on their own
/// responses (the server asks the client for its root list in the middle of
/// a tool call), so every line read off the wire goes through this
/// classification before anything else.
#[derive(Debug, Clone)]
pub enum Frame {
    /// A request from the peer, carrying an ID that expects a response.
    Request {
        id: RequestId,
        method: String,
        params: Option<Value>,
    },
    /// A notification; no response expected.
    Notification { method: String },
    /// A response to one of our own requests.
    Response(JsonRpcResponse),
}

impl Frame {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        if let Some(method) = value.get("method").and_then(Value::as_str) {
            let method = method.to_string();
            let params = value.get("params").cloned().filter(|p| !p.is_null());
            return Ok(match value.get("id") {
                Some(id) if !id.is_null() => Frame::Request {
                    id: serde_json::from_value(id.clone())?,
                    method,
                    params,
                },
                _ => Frame::Notification { method },
            });
        }
        Ok(Frame::Response(serde_json::from_value(value)?))
    }
}

// --- MCP-specific types ---

/// MCP initialize request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    #[serde(default)]
    pub client_info: ClientInfo,
}

/// Client capabilities sent during initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Present when the client can answer `roots/list` requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

/// Client info sent during initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// MCP initialize response result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

/// Server capabilities returned during initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

/// Server info returned during initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Tool definition returned by tools/list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Result of tools/list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,
}

/// Params for tools/call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// Result of tools/call.
///
/// A result carries a structured payload, an ordered list of content blocks,
/// or both. A result with neither is a protocol violation; consumers treat
/// it as an error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// A successful result with a structured payload and a text rendering.
    pub fn structured(payload: Value, text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            structured_content: Some(payload),
            is_error: false,
        }
    }

    /// A tool-level failure payload. The session stays up; the caller sees
    /// the message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            structured_content: None,
            is_error: true,
        }
    }
}

/// Content returned by a tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        mime_type: String,
    },
    Resource {
        uri: String,
        mime_type: Option<String>,
        text: Option<String>,
    },
}

impl ToolContent {
    /// Get text content if this is a text content block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A root directory declared by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Root {
    /// `file://` URI of the directory.
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Root {
    /// Build a root from an absolute directory path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            uri: format!("file://{}", path.as_ref().display()),
            name: None,
        }
    }

    /// The filesystem path of a `file://` root, or `None` for other schemes.
    pub fn to_path(&self) -> Option<PathBuf> {
        self.uri.strip_prefix("file://").map(PathBuf::from)
    }
}

/// Result of roots/list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRootsResult {
    pub roots: Vec<Root>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_request() {
        let req = JsonRpcRequest::new(1i64, "initialize").with_params(InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: "test".to_string(),
                version: "0.0.0".to_string(),
            },
        });
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"initialize\""));
    }

    #[test]
    fn classify_frames() {
        let request = r#"{"jsonrpc":"2.0","id":7,"method":"roots/list"}"#;
        assert!(matches!(
            Frame::parse(request).unwrap(),
            Frame::Request {
                id: RequestId::Number(7),
                ..
            }
        ));

        let notification = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(matches!(
            Frame::parse(notification).unwrap(),
            Frame::Notification { .. }
        ));

        let response = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#;
        match Frame::parse(response).unwrap() {
            Frame::Response(resp) => assert_eq!(resp.id, RequestId::Number(1)),
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_tool() {
        let json = r#"{
            "name": "count_csv_rows",
            "description": "Count the number of rows in a CSV file",
            "inputSchema": {"type": "object", "properties": {"file_path": {"type": "string"}}, "required": ["file_path"]}
        }"#;
        let tool: Tool = serde_json::from_str(json).unwrap();
        assert_eq!(tool.name, "count_csv_rows");
    }

    #[test]
    fn call_tool_result_with_structured_content() {
        let json =
            r#"{"content":[{"type":"text","text":"42"}],"structuredContent":{"result":42}}"#;
        let result: CallToolResult = serde_json::from_str(json).unwrap();
        assert_eq!(
            result.structured_content,
            Some(serde_json::json!({"result": 42}))
        );
        assert!(!result.is_error);
    }

    #[test]
    fn root_path_round_trip() {
        let root = Root::from_path("/home/user/data");
        assert_eq!(root.uri, "file:///home/user/data");
        assert_eq!(root.to_path(), Some(PathBuf::from("/home/user/data")));

        let remote = Root {
            uri: "https://example.com/data".to_string(),
            name: None,
        };
        assert_eq!(remote.to_path(), None);
    }

    #[test]
    fn capabilities_omit_roots_when_absent() {
        let caps = ClientCapabilities::default();
        assert_eq!(serde_json::to_string(&caps).unwrap(), "{}");

        let caps = ClientCapabilities {
            roots: Some(RootsCapability::default()),
        };
        let json = serde_json::to_string(&caps).unwrap();
        assert!(json.contains("\"roots\""));
    }
}
