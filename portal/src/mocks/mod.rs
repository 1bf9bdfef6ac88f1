//! In-memory provider implementations for tests.
//!
//! Both mocks keep their data behind `Arc<Mutex<..>>`, so clones share state:
//! a test can hold one handle while the portal uses another.

pub mod backend;
pub mod fixtures;
pub mod identity;
pub mod profiles;

pub use backend::MockBackend;
pub use identity::{GatewayCalls, MockIdentityGateway};
pub use profiles::{MockProfileStore, StoreCalls};

use crate::error::ProviderError;

fn poisoned<T>(_: T) -> ProviderError {
    ProviderError::Unavailable("mock state poisoned".to_string())
}
