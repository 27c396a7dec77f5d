//! PocketMCP command-line utility
//!
//! Talks to a PocketMCP server on a phone: waits for it to come up, runs the
//! MCP handshake, lists tools, or calls one tool. Results are printed to
//! stdout as pretty JSON; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pocket_rpc::{ClientConfig, PocketClient};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Poll interval for `--wait-healthy`
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// PocketMCP client utility
#[derive(Parser, Debug)]
#[command(name = "pocket-mcp")]
#[command(about = "PocketMCP client utility")]
#[command(version)]
#[command(after_help = "\
Examples:
  pocket-mcp 192.168.1.20:8080                     Print server health
  pocket-mcp 192.168.1.20:8080 secret --list-tools List tool schemas
  pocket-mcp ws://192.168.1.20:8080 --initialize   Handshake over WebSocket
  pocket-mcp 192.168.1.20:8080 --call shell --args '{\"command\": \"uptime\"}'
  pocket-mcp 192.168.1.20:8080 --wait-healthy 60   Wait for the server to start
")]
struct Cli {
    /// Phone endpoint: host[:port] or http(s):// / ws(s):// URL
    endpoint: Option<String>,

    /// API key, sent as X-API-Key
    api_key: Option<String>,

    /// Config file (default: <config dir>/pocket-mcp/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Request timeout in seconds [default: 30]
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// HTTP retry count for transient errors [default: 2]
    #[arg(long, value_name = "COUNT")]
    max_retries: Option<u32>,

    /// Wait until /health is ready
    #[arg(long, value_name = "SECONDS")]
    wait_healthy: Option<u64>,

    /// Call initialize
    #[arg(long)]
    initialize: bool,

    /// List available tool schemas
    #[arg(long)]
    list_tools: bool,

    /// Call tool by name
    #[arg(long, value_name = "TOOL_NAME")]
    call: Option<String>,

    /// JSON object of arguments for --call
    #[arg(long, value_name = "JSON", value_parser = parse_json_object, requires = "call")]
    args: Option<Map<String, Value>>,

    /// Log requests and retries to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Parse `--args`; clap reports failures as usage errors (exit code 2).
fn parse_json_object(raw: &str) -> std::result::Result<Map<String, Value>, String> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("--args must decode to a JSON object".to_string()),
        Err(e) => Err(format!("--args is not valid JSON: {e}")),
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pocket={default_level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

/// File config (if any) with command-line values layered on top
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let path = cli.config.clone().or_else(ClientConfig::default_path);
    let mut config = match &path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.base_url.clone_from(endpoint);
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(max_retries) = cli.max_retries {
        config.max_retries = max_retries;
    }

    Ok(config)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{rendered}");
    Ok(())
}

/// `--wait-healthy 0` means no wait
fn health_wait(cli: &Cli) -> Option<Duration> {
    cli.wait_healthy.filter(|secs| *secs > 0).map(Duration::from_secs)
}

/// Run the requested actions in order; health is printed when none was asked for.
async fn run_actions(client: &mut PocketClient, cli: &Cli) -> Result<()> {
    let mut emitted = false;

    if let Some(timeout) = health_wait(cli) {
        let health = client.wait_until_healthy(timeout, HEALTH_POLL_INTERVAL).await?;
        print_json(&health)?;
        emitted = true;
    }

    if cli.initialize {
        print_json(&client.initialize().await?)?;
        emitted = true;
    }

    if cli.list_tools {
        print_json(&client.list_tools().await?)?;
        emitted = true;
    }

    if let Some(tool) = &cli.call {
        let arguments = cli.args.clone().unwrap_or_default();
        print_json(&client.call_tool(tool, Some(Value::Object(arguments))).await?)?;
        emitted = true;
    }

    if !emitted {
        print_json(&client.health().await?)?;
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let mut client = PocketClient::new(&config)?;
    debug!(
        "Using {} via {} transport",
        client.endpoint(),
        client.transport_kind()
    );

    let outcome = run_actions(&mut client, cli).await;
    client.close().await;
    outcome
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
