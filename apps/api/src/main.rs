mod agent_client;
mod config;
mod errors;
mod generation;
mod routes;
mod state;
#[cfg(test)]
mod test_utils;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agent_client::AdkClient;
use crate::config::Config;
use crate::generation::orchestrator::AgentTarget;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting postgen v{}", env!("CARGO_PKG_VERSION"));

    // Initialize agent runtime client
    let runtime = AdkClient::new(
        config.agent_base_url.clone(),
        Duration::from_secs(config.upstream_timeout_secs),
    )?;
    info!(
        "Agent runtime client initialized ({} app={} user={}, timeout {}s)",
        config.agent_base_url,
        config.agent_app_name,
        config.agent_user_id,
        config.upstream_timeout_secs
    );

    // Build app state
    let state = AppState {
        runtime: Arc::new(runtime),
        target: AgentTarget::from_config(&config),
    };

    // Build router; the browser form may be served from another origin
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
