//! lambda-proxy - runs the forwarder behind a local HTTP host.
//!
//! `APIGW_URL` must be set; the process refuses to start without it.

use lambda_proxy::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let forwarder = Forwarder::from_env().map_err(|e| {
        tracing::error!("Cannot start forwarder: {}", e);
        e
    })?;
    let host_config = HostConfig::from_env()?;

    tracing::info!(
        "Forwarding to {} (preserve status: {})",
        forwarder.config().base_url,
        forwarder.config().preserve_status
    );
    tracing::info!("Try: curl http://localhost:{}/items", host_config.port);
    tracing::info!(
        "Raw events: curl -X POST -d @event.json http://localhost:{}/_invoke",
        host_config.port
    );

    FunctionHost::new(host_config, Arc::new(forwarder)).run().await
}
