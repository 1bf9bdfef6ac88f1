//! Account workflow: registration, login, logout, password reset and
//! profile edits.
//!
//! The async functions here are the multi-step provider sequences; the
//! [`AccountReducer`] wraps them with the form state (in-flight flag, inline
//! error, notice) and runs them as effects.

mod actions;
mod reducer;
mod state;

pub use actions::{AccountAction, Credentials};
pub use reducer::{AccountEnvironment, AccountReducer, DEFAULT_SETTLE_TIMEOUT};
pub use state::AccountState;

use crate::auth_state::AuthState;
use crate::error::{PortalError, ProviderError, Result};
use crate::navigation::Access;
use crate::providers::{IdentityGateway, ProfileStore};
use crate::types::{Member, MemberId, ProfileChanges};
use crate::validation::ValidRegistration;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Create an account and its member profile, then sign it in.
///
/// Steps: create the identity, set its display name to "First Last", publish
/// it, write the `member` profile document and reload the identity state.
/// A failure after the identity exists leaves it signed in without a profile.
///
/// # Errors
///
/// The first provider error encountered.
pub async fn register_member<G, P>(
    gateway: &G,
    profiles: &P,
    auth: &AuthState,
    registration: ValidRegistration,
    joined_at: DateTime<Utc>,
    settle: Duration,
) -> Result<Member>
where
    G: IdentityGateway,
    P: ProfileStore,
{
    let ValidRegistration {
        email,
        password,
        profile,
    } = registration;

    let identity = gateway.register(&email, &password).await?;
    let identity = gateway
        .update_display_name(&identity, &profile.display_name())
        .await?;
    auth.set_identity(identity.clone());

    let member = Member::from_registration(identity.uid, email, profile, joined_at);
    profiles.put_member(&member).await?;
    auth.reload();

    let id = member.id.clone();
    if auth
        .wait_until(|s| s.settled_for(Some(&id)) && s.profile.is_some(), settle)
        .await
        .is_none()
    {
        tracing::warn!(member = %id, "identity state did not settle after registration");
    }

    metrics::counter!("clubhouse_signups_total").increment(1);
    tracing::info!(member = %member.id, tier = %member.membership_type, "member registered");
    Ok(member)
}

/// Sign in and wait for the identity state to resolve.
///
/// Returns the member id and the resolved access level. If resolution does
/// not finish within `settle` the identity is still signed in and treated
/// as a plain member.
///
/// # Errors
///
/// The gateway's error, typically invalid credentials.
pub async fn sign_in<G: IdentityGateway>(
    gateway: &G,
    auth: &AuthState,
    credentials: &Credentials,
    settle: Duration,
) -> Result<(MemberId, Access)> {
    let identity = gateway
        .login(credentials.email.trim(), &credentials.password)
        .await?;
    let id = identity.uid.clone();
    auth.set_identity(identity);

    let access = auth
        .wait_until(|s| s.settled_for(Some(&id)), settle)
        .await
        .map_or(Access::Member, |snapshot| snapshot.access);
    Ok((id, access))
}

/// Sign out at the gateway, then clear the local identity.
///
/// # Errors
///
/// The gateway's error; the local identity is kept in that case.
pub async fn sign_out<G: IdentityGateway>(
    gateway: &G,
    auth: &AuthState,
    settle: Duration,
) -> Result<()> {
    if let Some(identity) = auth.identity() {
        gateway.logout(&identity).await?;
    }
    auth.clear();
    auth.wait_until(|s| s.settled_for(None), settle).await;
    Ok(())
}

/// Apply `changes` to the signed-in member's profile.
///
/// The profile is re-read from the store before editing. A name change is
/// pushed to the gateway's display name as well.
///
/// # Errors
///
/// - [`ProviderError::Unauthenticated`] when nobody is signed in
/// - [`PortalError::ProfileNotFound`] when the member has no profile document
/// - any provider error from the read, write or display-name update
pub async fn update_profile<G, P>(
    gateway: &G,
    profiles: &P,
    auth: &AuthState,
    changes: ProfileChanges,
    settle: Duration,
) -> Result<Member>
where
    G: IdentityGateway,
    P: ProfileStore,
{
    let identity = auth.identity().ok_or(ProviderError::Unauthenticated)?;
    let mut member = match profiles.get_member(&identity.uid).await {
        Ok(member) => member,
        Err(error) if error.is_not_found() => {
            return Err(PortalError::ProfileNotFound(identity.uid));
        },
        Err(error) => return Err(error.into()),
    };
    if member.id.as_str().is_empty() {
        member.id = identity.uid.clone();
    }

    let renamed = changes.first_name.is_some() || changes.last_name.is_some();
    member.apply(changes);
    profiles.put_member(&member).await?;

    if renamed {
        let updated = gateway
            .update_display_name(&identity, &member.full_name())
            .await?;
        auth.set_identity(updated);
    } else {
        auth.reload();
    }

    auth.wait_until(
        |s| s.settled_for(Some(&member.id)) && s.profile.as_ref() == Some(&member),
        settle,
    )
    .await;

    metrics::counter!("clubhouse_profile_updates_total").increment(1);
    Ok(member)
}
