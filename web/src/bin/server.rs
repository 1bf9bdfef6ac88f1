//! Clubhouse portal server.
//!
//! ```bash
//! # Firebase project settings go in .env (FIREBASE_API_KEY, ...)
//! cargo run --bin clubhouse-server
//! ```

use clubhouse_core::environment::SystemClock;
use clubhouse_portal::firebase::FirebaseBackend;
use clubhouse_web::{build_router, AppState, Config};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        project = %config.provider.project_id,
        bind = %config.server.bind_address(),
        banner_ttl = ?config.portal.banner_ttl,
        "Configuration loaded"
    );

    let metrics = PrometheusBuilder::new().install_recorder()?;
    clubhouse_portal::telemetry::describe();
    clubhouse_web::registry::describe_metrics();

    let backend = FirebaseBackend::new(config.provider.clone())?;
    let state = AppState::new(backend, Arc::new(SystemClock), config.portal, metrics)
        .with_shutdown_timeout(config.server.shutdown_timeout);
    let sessions = Arc::clone(&state.sessions);

    let app = build_router(state, config.server.request_timeout);
    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Clubhouse portal listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, closing portal clients...");
    sessions.shutdown_all(config.server.shutdown_timeout).await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
