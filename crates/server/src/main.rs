//! dositio server - HTTP REST API for the dositio product catalog
//!
//! This binary serves the catalog with per-route access guards, configured
//! from `.env`, an optional `server` config file and `DOSITIO__*` variables.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
