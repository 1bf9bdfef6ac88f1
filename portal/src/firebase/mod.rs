//! Firebase REST providers.
//!
//! [`FirebaseBackend`] pairs an Identity Toolkit gateway with a Firestore
//! profile store over one shared `reqwest` client. Both honour endpoint
//! overrides, so the local Firebase emulators work without code changes.

pub mod config;
pub mod firestore;
pub mod identity;
pub mod value;

pub use config::{ConfigError, ProviderConfig};
pub use firestore::FirestoreProfileStore;
pub use identity::FirebaseIdentityGateway;

use crate::providers::Backend;
use crate::types::Identity;
use std::sync::Arc;
use tokio::sync::watch;

/// Production [`Backend`] talking to a Firebase project.
#[derive(Clone)]
pub struct FirebaseBackend {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
}

impl FirebaseBackend {
    /// Build the shared HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Client`] when the TLS backend cannot be initialised.
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        tracing::info!(
            project = %config.project_id,
            auth_domain = %config.auth_domain,
            "firebase backend configured"
        );

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Project configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

impl Backend for FirebaseBackend {
    type Gateway = FirebaseIdentityGateway;
    type Profiles = FirestoreProfileStore;

    fn gateway(&self) -> Self::Gateway {
        FirebaseIdentityGateway::new(self.client.clone(), Arc::clone(&self.config))
    }

    fn profiles(&self, identity: watch::Receiver<Option<Identity>>) -> Self::Profiles {
        FirestoreProfileStore::new(self.client.clone(), Arc::clone(&self.config), identity)
    }
}
