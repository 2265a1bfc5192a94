//! Serve command implementation

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use trailquest::advisory;
use trailquest::config::Config;
use trailquest::server::{ApiState, start_http_server};

/// Run the JSON API until Ctrl-C
pub async fn serve_command(config: &Config, db_override: Option<&Path>, port: Option<u16>) -> Result<()> {
    let engine = super::open_engine(config, db_override)?;
    let state = ApiState {
        engine,
        advisor: Arc::from(advisory::from_config(&config.advisory)),
    };

    let handle = start_http_server(
        state,
        &config.server.bind,
        port.unwrap_or(config.server.port),
        config.server.auth_token.clone(),
    )?;

    tokio::signal::ctrl_c().await?;
    info!("[trailquest:serve] Shutting down");
    handle.shutdown();
    Ok(())
}
