//! Mock backend pairing the in-memory gateway and store.

use super::{MockIdentityGateway, MockProfileStore};
use crate::providers::Backend;
use crate::types::Identity;
use tokio::sync::watch;

/// Backend whose clients all share the same in-memory data.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    /// Shared gateway.
    pub gateway: MockIdentityGateway,
    /// Shared store.
    pub profiles: MockProfileStore,
}

impl MockBackend {
    /// Empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MockBackend {
    type Gateway = MockIdentityGateway;
    type Profiles = MockProfileStore;

    fn gateway(&self) -> Self::Gateway {
        self.gateway.clone()
    }

    fn profiles(&self, _identity: watch::Receiver<Option<Identity>>) -> Self::Profiles {
        self.profiles.clone()
    }
}
