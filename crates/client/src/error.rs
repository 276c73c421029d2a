//! Client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("chat endpoint error: {0}")]
    Api(String),

    /// The tool result carried neither a structured payload nor a text
    /// content block. Distinct from a tool-level failure: this is a
    /// protocol-shape violation and aborts the current query.
    #[error("unsupported content type from tool")]
    UnsupportedToolResult,

    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
