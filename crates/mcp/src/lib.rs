//! MCP session transport: protocol types plus both endpoints of the stdio
//! channel.
//!
//! The client endpoint spawns a tool server as a child process and speaks
//! newline-framed JSON-RPC over its pipes; the server endpoint serves the
//! same framing over the process's own stdin/stdout. Capability negotiation
//! (the `roots` feature) flows through `initialize`, after which the server
//! may issue `roots/list` requests back to the client mid tool-call.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Client, Root, ServerConfig};
//! use std::collections::HashMap;
//!
//! # async fn example() -> mcp::Result<()> {
//! let config = ServerConfig {
//!     name: "csvinfo".to_string(),
//!     command: "csvinfo".to_string(),
//!     args: vec!["--transport".to_string(), "stdio".to_string()],
//!     env: HashMap::new(),
//! };
//!
//! let client = Client::spawn(config, vec![Root::from_path("/data")]).await?;
//! client.initialize().await?;
//!
//! for tool in client.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let result = client.call_tool("count_csv_rows", Some(serde_json::json!({
//!     "file_path": "sales.csv"
//! }))).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod protocol;
mod service;

pub use client::{Client, DEFAULT_TIMEOUT, MAX_FRAME_SIZE, ServerConfig};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, ClientCapabilities, ClientInfo, Frame, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListRootsResult,
    ListToolsResult, PROTOCOL_VERSION, RequestId, Root, RootsCapability, ServerCapabilities,
    ServerInfo, Tool, ToolContent, ToolsCapability,
};
pub use service::{Peer, ToolHandler, serve_stdio};
