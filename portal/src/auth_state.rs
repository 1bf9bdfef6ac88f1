//! Identity state shared by a portal client.
//!
//! [`AuthState`] owns the current identity and a listener task that follows
//! identity changes: whenever the identity changes it fetches (or clears) the
//! member profile and publishes a new [`AuthSnapshot`] with the derived
//! [`Access`] level. Readers take the cached snapshot with
//! [`AuthState::current`] or follow it with [`AuthState::subscribe`].
//!
//! The listener has an explicit lifecycle: [`AuthState::start`] spawns it and
//! [`AuthState::shutdown`] aborts it.

use crate::navigation::Access;
use crate::providers::ProfileStore;
use crate::types::{Identity, Member, MemberId};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Resolved identity state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// `true` until the current identity's profile has been resolved.
    pub loading: bool,
    /// Signed-in identity, if any.
    pub identity: Option<Identity>,
    /// Member profile of the identity, if one could be loaded.
    pub profile: Option<Member>,
    /// Access level derived from the two above.
    pub access: Access,
}

impl AuthSnapshot {
    const fn initial() -> Self {
        Self {
            loading: true,
            identity: None,
            profile: None,
            access: Access::Unauthenticated,
        }
    }

    fn resolved(identity: Option<Identity>, profile: Option<Member>) -> Self {
        let access = Access::resolve(identity.is_some(), profile.as_ref());
        Self {
            loading: false,
            identity,
            profile,
            access,
        }
    }

    /// Id of the signed-in member.
    #[must_use]
    pub fn member_id(&self) -> Option<&MemberId> {
        self.identity.as_ref().map(|identity| &identity.uid)
    }

    /// `true` once resolved for the given member (or for no member).
    #[must_use]
    pub fn settled_for(&self, member: Option<&MemberId>) -> bool {
        !self.loading && self.member_id() == member
    }
}

/// Identity state with an identity-change listener.
#[derive(Debug)]
pub struct AuthState {
    identity: Arc<watch::Sender<Option<Identity>>>,
    snapshot: Arc<watch::Sender<AuthSnapshot>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthState {
    /// Create signed-out state. Nothing is resolved until [`start`](Self::start).
    #[must_use]
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        let (snapshot, _) = watch::channel(AuthSnapshot::initial());
        Self {
            identity: Arc::new(identity),
            snapshot: Arc::new(snapshot),
            listener: Mutex::new(None),
        }
    }

    /// Spawn the identity-change listener.
    ///
    /// The current identity is resolved immediately. Calling `start` again
    /// replaces the previous listener.
    pub fn start<P: ProfileStore>(&self, profiles: P) {
        let mut identities = self.identity.subscribe();
        identities.mark_changed();
        let snapshot = Arc::clone(&self.snapshot);

        let task = tokio::spawn(async move {
            while identities.changed().await.is_ok() {
                let identity = identities.borrow_and_update().clone();
                let profile = match &identity {
                    Some(identity) => load_profile(&profiles, &identity.uid).await,
                    None => None,
                };

                // A newer identity arrived while the profile was in flight.
                if identities.has_changed().unwrap_or(false) {
                    continue;
                }

                let next = AuthSnapshot::resolved(identity, profile);
                tracing::debug!(access = ?next.access, "identity state resolved");
                snapshot.send_replace(next);
            }
        });

        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    /// Stop the listener. The last snapshot stays readable.
    pub fn shutdown(&self) {
        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
            tracing::debug!("identity listener stopped");
        }
    }

    /// `true` while the listener is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// The cached snapshot.
    #[must_use]
    pub fn current(&self) -> AuthSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Follow snapshot changes. Dropping the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot.subscribe()
    }

    /// Follow the raw identity; used by Profile Store clients for bearer tokens.
    #[must_use]
    pub fn identity_receiver(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    /// Current identity without waiting for the profile.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Publish a new signed-in identity.
    pub fn set_identity(&self, identity: Identity) {
        self.mark_loading();
        self.identity.send_replace(Some(identity));
    }

    /// Sign out locally.
    pub fn clear(&self) {
        self.mark_loading();
        self.identity.send_replace(None);
    }

    /// Re-fetch the profile for the current identity.
    pub fn reload(&self) {
        self.mark_loading();
        self.identity.send_modify(|_| {});
    }

    /// Wait for a snapshot satisfying `predicate`.
    ///
    /// Returns `None` when the timeout elapses first.
    pub async fn wait_until<F>(&self, predicate: F, timeout: Duration) -> Option<AuthSnapshot>
    where
        F: FnMut(&AuthSnapshot) -> bool,
    {
        let mut receiver = self.snapshot.subscribe();
        match tokio::time::timeout(timeout, receiver.wait_for(predicate)).await {
            Ok(Ok(snapshot)) => Some(snapshot.clone()),
            _ => None,
        }
    }

    fn mark_loading(&self) {
        self.snapshot.send_if_modified(|snapshot| {
            let changed = !snapshot.loading;
            snapshot.loading = true;
            changed
        });
    }
}

impl Drop for AuthState {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn load_profile<P: ProfileStore>(profiles: &P, id: &MemberId) -> Option<Member> {
    match profiles.get_member(id).await {
        Ok(mut member) => {
            if member.id.as_str().is_empty() {
                member.id = id.clone();
            }
            Some(member)
        },
        Err(error) if error.is_not_found() => {
            tracing::error!(member = %id, "User profile not found");
            None
        },
        Err(error) => {
            tracing::error!(member = %id, %error, "failed to load member profile");
            None
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{fixtures, MockProfileStore};
    use crate::types::Role;

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn resolves_signed_out_on_start() {
        let auth = AuthState::new();
        assert!(auth.current().loading);

        auth.start(MockProfileStore::new());
        let snapshot = auth.wait_until(|s| !s.loading, WAIT).await.unwrap();
        assert_eq!(snapshot.access, Access::Unauthenticated);
        assert!(auth.is_running());
    }

    #[tokio::test]
    async fn admin_profile_yields_admin_access() {
        let store = MockProfileStore::new();
        let admin = fixtures::member("uid-admin", Some(Role::Admin));
        store.insert_member(admin.clone());

        let auth = AuthState::new();
        auth.start(store);
        auth.set_identity(fixtures::identity("uid-admin"));

        let snapshot = auth
            .wait_until(|s| s.settled_for(Some(&admin.id)), WAIT)
            .await
            .unwrap();
        assert_eq!(snapshot.access, Access::Admin);
        assert_eq!(snapshot.profile, Some(admin));
    }

    #[tokio::test]
    async fn missing_profile_is_member_without_profile() {
        let auth = AuthState::new();
        auth.start(MockProfileStore::new());
        auth.set_identity(fixtures::identity("uid-ghost"));

        let id = MemberId::new("uid-ghost");
        let snapshot = auth.wait_until(|s| s.settled_for(Some(&id)), WAIT).await.unwrap();
        assert_eq!(snapshot.access, Access::Member);
        assert_eq!(snapshot.profile, None);
    }

    #[tokio::test]
    async fn clear_returns_to_unauthenticated() {
        let store = MockProfileStore::new();
        store.insert_member(fixtures::member("uid-1", Some(Role::Member)));
        let auth = AuthState::new();
        auth.start(store);
        auth.set_identity(fixtures::identity("uid-1"));
        let id = MemberId::new("uid-1");
        auth.wait_until(|s| s.settled_for(Some(&id)), WAIT).await.unwrap();

        auth.clear();
        let snapshot = auth.wait_until(|s| s.settled_for(None), WAIT).await.unwrap();
        assert_eq!(snapshot.access, Access::Unauthenticated);
        assert!(snapshot.profile.is_none());
    }

    #[tokio::test]
    async fn reload_picks_up_role_change() {
        let store = MockProfileStore::new();
        let mut member = fixtures::member("uid-2", Some(Role::Member));
        store.insert_member(member.clone());
        let auth = AuthState::new();
        auth.start(store.clone());
        auth.set_identity(fixtures::identity("uid-2"));
        auth.wait_until(|s| s.access == Access::Member && !s.loading, WAIT)
            .await
            .unwrap();

        member.role = Some(Role::Admin);
        store.insert_member(member);
        auth.reload();

        let snapshot = auth.wait_until(|s| s.access == Access::Admin, WAIT).await.unwrap();
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn shutdown_stops_listener() {
        let auth = AuthState::new();
        auth.start(MockProfileStore::new());
        auth.wait_until(|s| !s.loading, WAIT).await.unwrap();

        auth.shutdown();
        tokio::task::yield_now().await;
        assert!(!auth.is_running());

        auth.set_identity(fixtures::identity("uid-3"));
        assert!(auth.wait_until(|s| !s.loading, Duration::from_millis(50)).await.is_none());
    }
}
