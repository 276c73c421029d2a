//! Server error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No way to determine permitted directories for this session.
    #[error(
        "no root directories available: provide --root-directory or connect with a client that supports the roots capability"
    )]
    NoRoots,

    /// The client declared the roots capability but returned nothing.
    /// This is a resolution failure, never a silent empty permission set.
    #[error("no root directories available from client")]
    EmptyRoots,

    /// The requested file is absent from every permitted directory.
    /// Reported to the tool caller as a value-level failure, not a crash.
    #[error("file not found in allowed directories {searched:?}: {path}")]
    NotFound {
        path: String,
        searched: Vec<PathBuf>,
    },

    #[error("invalid arguments: {0}")]
    BadArguments(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("unsupported transport '{0}': this build serves stdio only")]
    UnsupportedTransport(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
