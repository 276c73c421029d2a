mod catalog;
mod config;
mod error;
mod ollama;
mod query;

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use mcp::{Client, Root, ServerConfig};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};
use ollama::{ChatBackend, OllamaClient};
use query::{QuerySession, ToolTransport};

#[derive(Parser)]
#[command(name = "csvchat")]
#[command(about = "Interactive chat client bridging a local model to MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Command that launches the MCP tool server
    server_command: String,

    /// Arguments passed through to the server command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Directory to expose to the server as an MCP root (repeatable;
    /// give these before the server command)
    #[arg(long = "root")]
    roots: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();

    let mut roots = Vec::new();
    for dir in &cli.roots {
        let dir = dir
            .canonicalize()
            .map_err(|e| Error::Config(format!("invalid root {}: {e}", dir.display())))?;
        roots.push(Root::from_path(dir));
    }

    let backend = OllamaClient::new(&config.host, &config.port, &config.model);

    let server_config = ServerConfig {
        name: cli.server_command.clone(),
        command: cli.server_command.clone(),
        args: cli.server_args.clone(),
        env: HashMap::new(),
    };
    let client = Client::spawn(server_config, roots).await?;
    let server = client.initialize().await?;

    let tools = client.list_tools().await?;
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    println!(
        "Connected to {} with tools: {names:?}",
        server.server_info.name
    );
    println!("Model: {}", backend.model());
    println!("Type a query, or 'quit' to exit.\n");

    let session = QuerySession::new(client, backend);
    chat_loop(&session).await?;

    println!("\nSession ended.");
    Ok(())
}

/// Interactive loop: one query per line, errors are printed and the prompt
/// comes back. A failed query never terminates the process.
async fn chat_loop<T, B>(session: &QuerySession<T, B>) -> Result<()>
where
    T: ToolTransport,
    B: ChatBackend,
{
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        match session.process_query(query).await {
            Ok(answer) => println!("\n{answer}\n"),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    Ok(())
}
