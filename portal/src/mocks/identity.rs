//! Mock Identity Gateway.

use super::poisoned;
use crate::error::{ProviderError, ProviderResult};
use crate::providers::IdentityGateway;
use crate::types::{Identity, MemberId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    uid: MemberId,
    password: String,
    display_name: Option<String>,
}

/// Number of calls made to each gateway operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCalls {
    /// `register`
    pub register: usize,
    /// `login`
    pub login: usize,
    /// `logout`
    pub logout: usize,
    /// `reset_password`
    pub reset_password: usize,
    /// `update_display_name`
    pub update_display_name: usize,
}

impl GatewayCalls {
    /// Sum over all operations.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.register + self.login + self.logout + self.reset_password + self.update_display_name
    }
}

#[derive(Debug, Default)]
struct Counters {
    register: AtomicUsize,
    login: AtomicUsize,
    logout: AtomicUsize,
    reset_password: AtomicUsize,
    update_display_name: AtomicUsize,
}

/// Mock Identity Gateway.
///
/// Accounts live in memory keyed by lowercase email. Passwords shorter than
/// six characters are rejected as weak, like the hosted provider does.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityGateway {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    reset_requests: Arc<Mutex<Vec<String>>>,
    counters: Arc<Counters>,
    unavailable: Arc<AtomicBool>,
    latency: Duration,
}

impl MockIdentityGateway {
    /// Empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Seed an account, returning its uid.
    ///
    /// Seeding an existing email replaces the account.
    pub fn seed_account(&self, uid: &str, email: &str, password: &str) -> MemberId {
        let uid = MemberId::new(uid);
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(
                email.to_lowercase(),
                Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                    display_name: None,
                },
            );
        }
        uid
    }

    /// Simulate an outage: every call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Call counts so far.
    #[must_use]
    pub fn calls(&self) -> GatewayCalls {
        GatewayCalls {
            register: self.counters.register.load(Ordering::SeqCst),
            login: self.counters.login.load(Ordering::SeqCst),
            logout: self.counters.logout.load(Ordering::SeqCst),
            reset_password: self.counters.reset_password.load(Ordering::SeqCst),
            update_display_name: self.counters.update_display_name.load(Ordering::SeqCst),
        }
    }

    /// Emails that password resets were sent to.
    #[must_use]
    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Display name stored for an account.
    #[must_use]
    pub fn display_name(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .ok()?
            .get(&email.to_lowercase())?
            .display_name
            .clone()
    }

    async fn enter(&self, counter: &AtomicUsize) -> ProviderResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("identity gateway offline".to_string()));
        }
        Ok(())
    }
}

fn issue(uid: &MemberId, email: &str, display_name: Option<String>) -> Identity {
    Identity {
        uid: uid.clone(),
        email: email.to_string(),
        display_name,
        id_token: format!("id-{}", Uuid::new_v4().simple()),
        refresh_token: format!("refresh-{}", Uuid::new_v4().simple()),
    }
}

impl IdentityGateway for MockIdentityGateway {
    fn register(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ProviderResult<Identity>> + Send {
        let gateway = self.clone();
        let email = email.trim().to_string();
        let password = password.to_string();

        async move {
            gateway.enter(&gateway.counters.register).await?;
            if password.chars().count() < 6 {
                return Err(ProviderError::WeakPassword(
                    "Password should be at least 6 characters".to_string(),
                ));
            }
            let mut accounts = gateway.accounts.lock().map_err(poisoned)?;
            let key = email.to_lowercase();
            if accounts.contains_key(&key) {
                return Err(ProviderError::EmailAlreadyInUse);
            }
            let uid = MemberId::new(format!("uid-{}", Uuid::new_v4().simple()));
            accounts.insert(
                key,
                Account {
                    uid: uid.clone(),
                    password,
                    display_name: None,
                },
            );
            Ok(issue(&uid, &email, None))
        }
    }

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ProviderResult<Identity>> + Send {
        let gateway = self.clone();
        let email = email.trim().to_string();
        let password = password.to_string();

        async move {
            gateway.enter(&gateway.counters.login).await?;
            let accounts = gateway.accounts.lock().map_err(poisoned)?;
            match accounts.get(&email.to_lowercase()) {
                Some(account) if account.password == password => {
                    Ok(issue(&account.uid, &email, account.display_name.clone()))
                },
                _ => Err(ProviderError::InvalidCredentials),
            }
        }
    }

    fn logout(&self, _identity: &Identity) -> impl Future<Output = ProviderResult<()>> + Send {
        let gateway = self.clone();
        async move { gateway.enter(&gateway.counters.logout).await }
    }

    fn reset_password(&self, email: &str) -> impl Future<Output = ProviderResult<()>> + Send {
        let gateway = self.clone();
        let email = email.trim().to_string();

        async move {
            gateway.enter(&gateway.counters.reset_password).await?;
            let known = gateway
                .accounts
                .lock()
                .map_err(poisoned)?
                .contains_key(&email.to_lowercase());
            if !known {
                return Err(ProviderError::NotFound {
                    collection: "accounts",
                    id: email,
                });
            }
            gateway.reset_requests.lock().map_err(poisoned)?.push(email);
            Ok(())
        }
    }

    fn update_display_name(
        &self,
        identity: &Identity,
        display_name: &str,
    ) -> impl Future<Output = ProviderResult<Identity>> + Send {
        let gateway = self.clone();
        let identity = identity.clone();
        let display_name = display_name.to_string();

        async move {
            gateway.enter(&gateway.counters.update_display_name).await?;
            let mut accounts = gateway.accounts.lock().map_err(poisoned)?;
            let account = accounts
                .get_mut(&identity.email.to_lowercase())
                .ok_or(ProviderError::Unauthenticated)?;
            account.display_name = Some(display_name.clone());
            Ok(Identity {
                display_name: Some(display_name),
                ..identity
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_then_login() {
        let gateway = MockIdentityGateway::new();
        let registered = gateway.register("Kai@club.test", "spiker99").await.unwrap();
        let logged_in = gateway.login("kai@club.test", "spiker99").await.unwrap();

        assert_eq!(registered.uid, logged_in.uid);
        assert_ne!(registered.id_token, logged_in.id_token);
        assert_eq!(
            gateway.register("kai@club.test", "another1").await,
            Err(ProviderError::EmailAlreadyInUse)
        );
        assert_eq!(gateway.calls().register, 2);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let gateway = MockIdentityGateway::new();
        gateway.seed_account("uid-1", "jo@club.test", "libero01");
        assert_eq!(
            gateway.login("jo@club.test", "libero02").await,
            Err(ProviderError::InvalidCredentials)
        );
        assert_eq!(
            gateway.login("nobody@club.test", "libero01").await,
            Err(ProviderError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let gateway = MockIdentityGateway::new();
        gateway.set_unavailable(true);
        assert!(matches!(
            gateway.reset_password("jo@club.test").await,
            Err(ProviderError::Unavailable(_))
        ));
    }
}
