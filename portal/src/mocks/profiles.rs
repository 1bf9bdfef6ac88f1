//! Mock Profile Store.

use super::poisoned;
use crate::error::{ProviderError, ProviderResult};
use crate::providers::ProfileStore;
use crate::types::{
    Member, MemberId, NewRegistration, Registration, RegistrationId, SessionId, TrainingSession,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Number of calls made to each store operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    /// `get_member`
    pub get_member: usize,
    /// `put_member`
    pub put_member: usize,
    /// `list_members`
    pub list_members: usize,
    /// `list_sessions`
    pub list_sessions: usize,
    /// `create_registration`
    pub create_registration: usize,
    /// `list_registrations`
    pub list_registrations: usize,
}

#[derive(Debug, Default)]
struct Counters {
    get_member: AtomicUsize,
    put_member: AtomicUsize,
    list_members: AtomicUsize,
    list_sessions: AtomicUsize,
    create_registration: AtomicUsize,
    list_registrations: AtomicUsize,
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    sessions: AtomicBool,
    registrations: AtomicBool,
}

/// Mock Profile Store.
///
/// Like the hosted store it performs no uniqueness or capacity checks on
/// registrations.
#[derive(Debug, Clone, Default)]
pub struct MockProfileStore {
    members: Arc<Mutex<HashMap<MemberId, Member>>>,
    sessions: Arc<Mutex<Vec<TrainingSession>>>,
    registrations: Arc<Mutex<Vec<Registration>>>,
    counters: Arc<Counters>,
    faults: Arc<Faults>,
    latency: Duration,
}

impl MockProfileStore {
    /// Empty store.
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

    /// Seed or replace a member document.
    pub fn insert_member(&self, member: Member) {
        if let Ok(mut members) = self.members.lock() {
            members.insert(member.id.clone(), member);
        }
    }

    /// Seed a session document.
    pub fn insert_session(&self, session: TrainingSession) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.retain(|existing| existing.id != session.id);
            sessions.push(session);
        }
    }

    /// Stored member, if any.
    #[must_use]
    pub fn member(&self, id: &MemberId) -> Option<Member> {
        self.members.lock().ok()?.get(id).cloned()
    }

    /// Every stored registration, in write order.
    #[must_use]
    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations
            .lock()
            .map(|registrations| registrations.clone())
            .unwrap_or_default()
    }

    /// Simulate an outage of the whole store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make session listing fail.
    pub fn fail_sessions(&self, fail: bool) {
        self.faults.sessions.store(fail, Ordering::SeqCst);
    }

    /// Make registration writes fail.
    pub fn fail_registrations(&self, fail: bool) {
        self.faults.registrations.store(fail, Ordering::SeqCst);
    }

    /// Call counts so far.
    #[must_use]
    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            get_member: self.counters.get_member.load(Ordering::SeqCst),
            put_member: self.counters.put_member.load(Ordering::SeqCst),
            list_members: self.counters.list_members.load(Ordering::SeqCst),
            list_sessions: self.counters.list_sessions.load(Ordering::SeqCst),
            create_registration: self.counters.create_registration.load(Ordering::SeqCst),
            list_registrations: self.counters.list_registrations.load(Ordering::SeqCst),
        }
    }

    async fn enter(&self, counter: &AtomicUsize, fault: Option<&AtomicBool>) -> ProviderResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failing = self.faults.unavailable.load(Ordering::SeqCst)
            || fault.is_some_and(|fault| fault.load(Ordering::SeqCst));
        if failing {
            return Err(ProviderError::Unavailable("profile store offline".to_string()));
        }
        Ok(())
    }
}

impl ProfileStore for MockProfileStore {
    fn get_member(&self, id: &MemberId) -> impl Future<Output = ProviderResult<Member>> + Send {
        let store = self.clone();
        let id = id.clone();

        async move {
            store.enter(&store.counters.get_member, None).await?;
            store
                .members
                .lock()
                .map_err(poisoned)?
                .get(&id)
                .cloned()
                .ok_or(ProviderError::NotFound {
                    collection: "users",
                    id: id.to_string(),
                })
        }
    }

    fn put_member(&self, member: &Member) -> impl Future<Output = ProviderResult<()>> + Send {
        let store = self.clone();
        let member = member.clone();

        async move {
            store.enter(&store.counters.put_member, None).await?;
            store
                .members
                .lock()
                .map_err(poisoned)?
                .insert(member.id.clone(), member);
            Ok(())
        }
    }

    fn list_members(&self) -> impl Future<Output = ProviderResult<Vec<Member>>> + Send {
        let store = self.clone();

        async move {
            store.enter(&store.counters.list_members, None).await?;
            let mut members: Vec<Member> =
                store.members.lock().map_err(poisoned)?.values().cloned().collect();
            members.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(members)
        }
    }

    fn list_sessions(&self) -> impl Future<Output = ProviderResult<Vec<TrainingSession>>> + Send {
        let store = self.clone();

        async move {
            store
                .enter(&store.counters.list_sessions, Some(&store.faults.sessions))
                .await?;
            Ok(store.sessions.lock().map_err(poisoned)?.clone())
        }
    }

    fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> impl Future<Output = ProviderResult<Registration>> + Send {
        let store = self.clone();

        async move {
            store
                .enter(
                    &store.counters.create_registration,
                    Some(&store.faults.registrations),
                )
                .await?;
            let stored = Registration::stored(
                RegistrationId::new(Uuid::new_v4().to_string()),
                registration,
            );
            store
                .registrations
                .lock()
                .map_err(poisoned)?
                .push(stored.clone());
            Ok(stored)
        }
    }

    fn list_registrations(
        &self,
        session: Option<&SessionId>,
    ) -> impl Future<Output = ProviderResult<Vec<Registration>>> + Send {
        let store = self.clone();
        let session = session.cloned();

        async move {
            store.enter(&store.counters.list_registrations, None).await?;
            let registrations = store.registrations.lock().map_err(poisoned)?;
            Ok(registrations
                .iter()
                .filter(|r| session.as_ref().is_none_or(|id| &r.session_id == id))
                .cloned()
                .collect())
        }
    }
}
