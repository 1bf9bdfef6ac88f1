//! Application state for Axum handlers.

use crate::registry::SessionRegistry;
use clubhouse_core::environment::Clock;
use clubhouse_portal::{Backend, Portal, PortalSettings};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is behind an `Arc` or cheap to copy.
pub struct AppState<B: Backend> {
    /// Provider pair every portal client is built from
    pub backend: Arc<B>,
    /// Signed-in portal clients
    pub sessions: Arc<SessionRegistry<B>>,
    /// Clock handed to each portal
    pub clock: Arc<dyn Clock>,
    /// Per-client tunables
    pub settings: PortalSettings,
    /// Prometheus exporter for `GET /metrics`
    pub metrics: PrometheusHandle,
    /// Budget for shutting down a discarded portal client
    pub shutdown_timeout: Duration,
}

impl<B: Backend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            sessions: Arc::clone(&self.sessions),
            clock: Arc::clone(&self.clock),
            settings: self.settings,
            metrics: self.metrics.clone(),
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl<B: Backend> AppState<B> {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        backend: B,
        clock: Arc<dyn Clock>,
        settings: PortalSettings,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            backend: Arc::new(backend),
            sessions: Arc::new(SessionRegistry::new()),
            clock,
            settings,
            metrics,
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    /// Override the shutdown budget for discarded clients.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Start a fresh, signed-out portal client.
    #[must_use]
    pub fn start_portal(&self) -> Arc<Portal<B>> {
        Arc::new(Portal::start(
            &self.backend,
            Arc::clone(&self.clock),
            self.settings,
        ))
    }

    /// Shut down a portal client that will not be registered.
    pub async fn discard(&self, portal: &Portal<B>) {
        if let Err(error) = portal.shutdown(self.shutdown_timeout).await {
            tracing::warn!(%error, "discarded portal client did not shut down cleanly");
        }
    }
}
