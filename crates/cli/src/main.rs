use anyhow::Result;
use clap::Parser;
use opend_gateway::{BrokerAdapter, GatewayConfig};
use opend_mcp::{Dispatcher, McpServer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "opend-mcp")]
#[command(about = "MCP stdio server exposing an OpenD brokerage gateway as agent tools")]
#[command(version)]
struct Cli {
    /// Gateway host
    #[arg(long, env = "OPEND_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Gateway port
    #[arg(long, env = "OPEND_PORT", default_value = "11111")]
    port: u16,

    /// Trade unlock credential. Omit to run quote-only.
    #[arg(long, env = "OPEND_UNLOCK_PWD", hide_env_values = true)]
    unlock_pwd: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the MCP transport; every log line goes to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(host = %cli.host, port = cli.port, "starting opend-mcp");

    let adapter = BrokerAdapter::connect(GatewayConfig {
        host: cli.host,
        port: cli.port,
        unlock_credential: cli.unlock_pwd,
    })
    .await;

    let server = McpServer::new(Dispatcher::new(adapter));
    server.run().await?;
    Ok(())
}
