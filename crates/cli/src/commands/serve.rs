use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use simtrack_http::{AppState, create_router, start_reconcile_poller};

use crate::commands::build_services;
use crate::config::Config;

pub(crate) async fn run(config: Config, host: String, port: u16) -> Result<()> {
    let services = build_services(&config).await?;

    start_reconcile_poller(
        Arc::clone(&services.reconcile),
        Duration::from_secs(config.poll_interval_secs),
    );

    let state = Arc::new(AppState {
        reconcile: services.reconcile,
        provision: services.provision,
        history: services.history,
        registry: services.registry,
        api_token: config.api_token,
    });

    let router = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
