use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use weather_mcp::weather::{WeatherClient, WeatherConfig, WeatherTool};
use weather_mcp::{McpServer, ServerConfig, StdioTransport, ToolRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let client = WeatherClient::new(WeatherConfig::default())
        .wrap_err("Failed to create weather client")?;

    let mut registry = ToolRegistry::new();
    registry
        .register(WeatherTool::new(client))
        .wrap_err("Failed to register weather tool")?;

    let server = McpServer::new(ServerConfig::default(), registry);
    server
        .serve(StdioTransport::new())
        .await
        .wrap_err("Server error")?;

    Ok(())
}
