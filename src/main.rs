//! Para Gateway - main entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use para_gateway::{
    channels::{Channel, HttpChannel, StdioChannel},
    config::{Config, HttpConfig},
    gateway::Gateway,
    invoker::Invoker,
    tools::ToolRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "para-gateway")]
#[command(about = "Protocol gateway exposing the para CLI over stdio or HTTP/SSE")]
#[command(version)]
struct Cli {
    /// Serve over HTTP/SSE instead of stdio (same as USE_HTTP=true)
    #[arg(long)]
    http: bool,

    /// Bind host for HTTP mode
    #[arg(long)]
    host: Option<String>,

    /// Bind port for HTTP mode
    #[arg(long)]
    port: Option<u16>,

    /// Path to the para executable (overrides PARA_CLI_PATH)
    #[arg(long, value_name = "PATH")]
    para_cli: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    let _ = dotenvy::dotenv();

    let mut config = Config::from_env()?;

    // CLI flags win over the environment
    if let Some(path) = cli.para_cli {
        config.para_cli_path = path;
    }
    if cli.http && config.http.is_none() {
        config.http = Some(HttpConfig::default());
    }
    if let Some(http) = config.http.as_mut() {
        if let Some(host) = cli.host {
            http.host = host;
        }
        if let Some(port) = cli.port {
            http.port = port;
        }
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("para_gateway=info,tower_http=debug"));

    if config.http.is_some() {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    } else {
        // stdout carries the protocol in stdio mode; logs go to stderr
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!("Starting para gateway");
    tracing::info!("para CLI path: {}", config.para_cli_path.display());
    for var in ["PARA_HOME", "PARA_ARCHIVE"] {
        match std::env::var(var) {
            Ok(val) => tracing::info!("{var}: {val}"),
            Err(_) => tracing::info!("{var}: not set"),
        }
    }

    let registry = ToolRegistry::builtin()?;
    let invoker = Invoker::from_config(&config);
    let gateway = Arc::new(Gateway::new(registry, invoker, config.max_concurrency));

    match config.http.clone() {
        Some(http) => {
            let channel = HttpChannel::new(http);
            channel.serve(gateway).await?;
        }
        None => {
            tracing::info!("Running in stdio mode");
            let channel = StdioChannel::new();
            channel.serve(gateway).await?;
        }
    }

    Ok(())
}
