mod dataset;
mod error;
mod lookup;
mod roots;
mod tools;

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use error::{Error, Result};
use tools::CsvInfo;

#[derive(Parser)]
#[command(name = "csvinfo")]
#[command(about = "MCP server exposing CSV inspection tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Fallback root directory for file lookups, used when the connected
    /// client does not declare the roots capability
    #[arg(long)]
    root_directory: Option<PathBuf>,

    /// Session transport
    #[arg(short, long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// JSON-RPC over the process's stdin/stdout
    Stdio,
    /// Server-sent events over HTTP
    Sse,
    /// Streamable HTTP
    StreamableHttp,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout belongs to the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let root_directory = cli
        .root_directory
        .map(|dir| validate_directory(&dir))
        .transpose()?;

    match cli.transport {
        Transport::Stdio => {
            let handler = CsvInfo::new(root_directory);
            mcp::serve_stdio("csvinfo", handler).await?;
            Ok(())
        }
        Transport::Sse => Err(Error::UnsupportedTransport("sse".to_string())),
        Transport::StreamableHttp => {
            Err(Error::UnsupportedTransport("streamable-http".to_string()))
        }
    }
}

/// Validate and normalize the fallback directory before any session starts.
fn validate_directory(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::MissingDirectory(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(Error::NotADirectory(path.to_path_buf()));
    }
    Ok(path.canonicalize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn existing_directory_is_canonicalized() {
        let dir = TempDir::new().unwrap();
        let validated = validate_directory(dir.path()).unwrap();
        assert!(validated.is_absolute());
        assert!(validated.is_dir());
    }

    #[test]
    fn missing_directory_is_rejected() {
        let err = validate_directory(Path::new("/nonexistent/roots")).unwrap_err();
        assert!(matches!(err, Error::MissingDirectory(_)));
    }

    #[test]
    fn plain_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.csv");
        std::fs::write(&file, "a,b\n").unwrap();

        let err = validate_directory(&file).unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }

    #[test]
    fn transport_flag_accepts_the_known_set() {
        use clap::CommandFactory;
        let cli = Cli::try_parse_from(["csvinfo", "--transport", "stdio"]).unwrap();
        assert_eq!(cli.transport, Transport::Stdio);

        let cli = Cli::try_parse_from(["csvinfo", "-t", "sse"]).unwrap();
        assert_eq!(cli.transport, Transport::Sse);

        // An invalid selection fails parsing, which exits non-zero with a
        // descriptive message before any session starts.
        assert!(Cli::try_parse_from(["csvinfo", "--transport", "carrier-pigeon"]).is_err());
        Cli::command().debug_assert();
    }
}
