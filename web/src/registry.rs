//! Open portal clients, keyed by bearer token.
//!
//! Each successful login or registration starts a [`Portal`] and files it
//! under a fresh random token. The token is the only thing the HTTP client
//! holds; identity tokens never leave the server.

use clubhouse_portal::{Backend, Portal};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Registry of signed-in portal clients.
pub struct SessionRegistry<B: Backend> {
    clients: RwLock<HashMap<Uuid, Arc<Portal<B>>>>,
}

impl<B: Backend> Default for SessionRegistry<B> {
    fn default() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }
}

impl<B: Backend> SessionRegistry<B> {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File `portal` under a new token.
    pub async fn open(&self, portal: Arc<Portal<B>>) -> Uuid {
        let token = Uuid::new_v4();
        let mut clients = self.clients.write().await;
        clients.insert(token, portal);
        record_open(clients.len());
        token
    }

    /// Portal for `token`.
    pub async fn get(&self, token: &Uuid) -> Option<Arc<Portal<B>>> {
        self.clients.read().await.get(token).cloned()
    }

    /// Remove and return the portal for `token`.
    pub async fn close(&self, token: &Uuid) -> Option<Arc<Portal<B>>> {
        let mut clients = self.clients.write().await;
        let portal = clients.remove(token);
        record_open(clients.len());
        portal
    }

    /// Number of open clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// `true` when no client is open.
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Close every client, shutting each portal down.
    pub async fn shutdown_all(&self, timeout: Duration) {
        let drained: Vec<_> = {
            let mut clients = self.clients.write().await;
            let drained = clients.drain().collect();
            record_open(0);
            drained
        };

        tracing::info!(count = drained.len(), "closing portal clients");
        for (token, portal) in drained {
            if let Err(error) = portal.shutdown(timeout).await {
                tracing::warn!(%token, %error, "portal client did not shut down cleanly");
            }
        }
    }
}

/// Register the registry's gauge description with the metrics recorder.
pub fn describe_metrics() {
    metrics::describe_gauge!("clubhouse_open_sessions", "Signed-in portal clients");
}

#[allow(clippy::cast_precision_loss)]
fn record_open(count: usize) {
    metrics::gauge!("clubhouse_open_sessions").set(count as f64);
}
