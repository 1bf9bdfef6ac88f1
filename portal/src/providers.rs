//! Provider traits for the external services the portal talks to.
//!
//! The portal never performs identity or storage I/O itself: reducers
//! describe the calls and the implementations here execute them. Production
//! uses the Firebase REST clients in [`crate::firebase`]; tests use
//! [`crate::mocks`].

use crate::error::ProviderResult;
use crate::types::{
    Identity, Member, MemberId, NewRegistration, Registration, SessionId, TrainingSession,
};
use std::future::Future;
use tokio::sync::watch;

/// Email/password identity provider.
pub trait IdentityGateway: Clone + Send + Sync + 'static {
    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// [`ProviderError::EmailAlreadyInUse`](crate::error::ProviderError::EmailAlreadyInUse)
    /// when the email already has an account.
    fn register(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ProviderResult<Identity>> + Send;

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// [`ProviderError::InvalidCredentials`](crate::error::ProviderError::InvalidCredentials)
    /// when the pair is rejected.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ProviderResult<Identity>> + Send;

    /// End a session.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the gateway refuses.
    fn logout(&self, identity: &Identity) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Send a password reset email.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the gateway refuses.
    fn reset_password(&self, email: &str) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Set the display name on the identity, returning the updated identity.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the gateway refuses.
    fn update_display_name(
        &self,
        identity: &Identity,
        display_name: &str,
    ) -> impl Future<Output = ProviderResult<Identity>> + Send;
}

/// Document store holding members, sessions and registrations.
pub trait ProfileStore: Clone + Send + Sync + 'static {
    /// Fetch a member profile.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NotFound`](crate::error::ProviderError::NotFound) when no
    /// profile exists for `id`.
    fn get_member(&self, id: &MemberId) -> impl Future<Output = ProviderResult<Member>> + Send;

    /// Create or replace a member profile.
    ///
    /// # Errors
    ///
    /// Returns a provider error on write failure.
    fn put_member(&self, member: &Member) -> impl Future<Output = ProviderResult<()>> + Send;

    /// List every member profile.
    ///
    /// # Errors
    ///
    /// Returns a provider error on read failure.
    fn list_members(&self) -> impl Future<Output = ProviderResult<Vec<Member>>> + Send;

    /// List every training session, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns a provider error on read failure.
    fn list_sessions(&self) -> impl Future<Output = ProviderResult<Vec<TrainingSession>>> + Send;

    /// Store a registration, returning it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns a provider error on write failure.
    fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> impl Future<Output = ProviderResult<Registration>> + Send;

    /// List registrations, optionally for one session only.
    ///
    /// # Errors
    ///
    /// Returns a provider error on read failure.
    fn list_registrations(
        &self,
        session: Option<&SessionId>,
    ) -> impl Future<Output = ProviderResult<Vec<Registration>>> + Send;
}

/// A matched pair of providers.
///
/// The Profile Store authenticates with whatever identity is current, so it
/// is built from a receiver of the portal's identity channel.
pub trait Backend: Send + Sync + 'static {
    /// Identity Gateway implementation.
    type Gateway: IdentityGateway;
    /// Profile Store implementation.
    type Profiles: ProfileStore;

    /// Build a gateway client.
    fn gateway(&self) -> Self::Gateway;

    /// Build a store client that authenticates as the identity in `identity`.
    fn profiles(&self, identity: watch::Receiver<Option<Identity>>) -> Self::Profiles;
}
