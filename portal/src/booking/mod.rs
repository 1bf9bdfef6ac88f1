//! Session-booking workflow.
//!
//! Two provider-facing operations, [`list_upcoming`] and [`register`], plus
//! the [`BookingReducer`] that drives the sessions page: loading, selecting a
//! session, confirming a registration and the result banner.
//!
//! Neither operation guards against duplicates or over-capacity bookings;
//! the reducer's in-flight flag only stops a second confirm from the same
//! page while the first is pending.

mod actions;
mod reducer;
mod state;

pub use actions::BookingAction;
pub use reducer::{BookingEnvironment, BookingReducer};
pub use state::{Banner, BannerKind, BookingState};

use crate::error::ProviderResult;
use crate::providers::ProfileStore;
use crate::types::{MemberId, NewRegistration, Registration, SessionId, TrainingSession};
use chrono::{DateTime, NaiveDate, Utc};

/// Banner text after a successful registration.
pub const REGISTERED_MESSAGE: &str = "Successfully registered for session!";
/// Banner text when a registration write fails.
pub const REGISTER_FAILED_MESSAGE: &str = "Failed to register for session";
/// Banner text when the session list cannot be fetched.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load sessions";

/// Sessions dated `today` or later, by date then start time.
///
/// # Errors
///
/// Returns the provider error unchanged; there is no retry.
pub async fn list_upcoming<P: ProfileStore>(
    profiles: &P,
    today: NaiveDate,
) -> ProviderResult<Vec<TrainingSession>> {
    let mut sessions = profiles.list_sessions().await?;
    sessions.retain(|session| session.date >= today);
    sessions.sort_by(|a, b| {
        (a.date, a.start_time)
            .cmp(&(b.date, b.start_time))
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(sessions)
}

/// Write a registration for `member_id` on `session_id`.
///
/// Not idempotent: two calls write two registrations. Capacity is not checked.
///
/// # Errors
///
/// Returns the provider error unchanged; there is no retry.
pub async fn register<P: ProfileStore>(
    profiles: &P,
    session_id: SessionId,
    member_id: MemberId,
    now: DateTime<Utc>,
) -> ProviderResult<Registration> {
    let registration = profiles
        .create_registration(NewRegistration {
            session_id,
            member_id,
            registered_at: now,
        })
        .await?;
    metrics::counter!("clubhouse_registrations_total").increment(1);
    tracing::info!(
        registration = %registration.id,
        session = %registration.session_id,
        member = %registration.member_id,
        "session registration stored"
    );
    Ok(registration)
}
