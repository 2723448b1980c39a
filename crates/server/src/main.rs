mod api;
mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use bidwright_core::config::{AppConfig, LoadOptions};
use bidwright_core::logging;
use tokio::sync::oneshot;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    // Logging depends on the loaded config, so it comes first.
    let config = AppConfig::load(LoadOptions::default())?;
    logging::init(&config.logging);

    let app = bootstrap::bootstrap(config)?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let grace_period = Duration::from_secs(app.config.server.graceful_shutdown_secs);

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "bidwright-server listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let router = app.router();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    wait_for_shutdown().await?;
    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_period_secs = grace_period.as_secs(),
        "bidwright-server stopping"
    );
    let _ = stop_tx.send(());

    match tokio::time::timeout(grace_period, server).await {
        Ok(joined) => joined??,
        Err(_) => warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not drain before the grace period elapsed"
        ),
    }
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
