//! intake-server: standalone REST server for the contact intake flow.
//!
//! Reads config from `INTAKE_CONFIG` (YAML) plus env overrides; see
//! `intake_core::config`. A `.env` file in the working directory is honoured.

use std::sync::Arc;

use intake_core::{IntakeConfig, SimulatedSink};
use intake_server::directory::build_directory;
use intake_server::router::build_router;
use intake_server::state::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,intake_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = IntakeConfig::from_env()?;
    tracing::info!(
        ceiling_ms = config.lookup_ceiling_ms,
        submit_delay_ms = config.submit_delay_ms,
        session_ttl_secs = config.session_ttl_secs,
        "Configuration loaded"
    );

    let directory = build_directory(&config.directory).await?;
    let sink = Arc::new(SimulatedSink::new(config.submit_delay()));
    let state =
        AppState::new(directory, config.ceiling(), sink).with_session_ttl(config.session_ttl());
    let sweeper = state.sessions.spawn_sweeper();
    tracing::info!(
        idle_ttl_secs = state.sessions.idle_ttl().as_secs(),
        "session sweeper started"
    );
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "intake-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    sweeper.abort();
    Ok(())
}
