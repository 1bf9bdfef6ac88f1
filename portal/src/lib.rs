//! # Clubhouse Portal
//!
//! Membership portal workflows for Spelthorne VC: account registration and
//! login, the member dashboard, training session booking, the admin panel and
//! role-gated navigation.
//!
//! Credential handling and storage belong to two external providers, the
//! Identity Gateway and the Profile Store ([`providers`]). Everything in this
//! crate is client-side logic around them:
//!
//! - [`account`]: registration (with local [`validation`]), login, logout,
//!   password reset and profile edits
//! - [`booking`]: listing upcoming sessions and registering for one
//! - [`auth_state`]: the identity listener and its cached [`AuthSnapshot`]
//! - [`navigation`]: redirect-on-mismatch routing over [`Access`] levels
//! - [`views`]: page view models
//! - [`firebase`]: REST clients for the hosted providers
//!
//! ## Example
//!
//! ```ignore
//! use clubhouse_portal::firebase::{FirebaseBackend, ProviderConfig};
//! use clubhouse_portal::{Navigation, Portal, PortalSettings, View};
//!
//! let backend = FirebaseBackend::new(ProviderConfig::from_env()?)?;
//! let portal = Portal::start(&backend, Arc::new(SystemClock), PortalSettings::default());
//!
//! portal.login(credentials).await?;
//! assert_eq!(portal.navigate(View::Admin), Navigation::Redirect(View::Dashboard));
//! ```

pub mod account;
pub mod auth_state;
pub mod booking;
pub mod error;
pub mod firebase;
pub mod format;
pub mod navigation;
pub mod portal;
pub mod providers;
pub mod telemetry;
pub mod types;
pub mod validation;
pub mod views;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use auth_state::{AuthSnapshot, AuthState};
pub use error::{PortalError, ProviderError, ValidationError};
pub use navigation::{navigate, Access, Navigation, View};
pub use portal::{Portal, PortalSettings};
pub use providers::{Backend, IdentityGateway, ProfileStore};
pub use types::{
    EmergencyContact, Identity, Member, MemberId, MembershipTier, Money, ProfileChanges,
    Registration, Role, SessionId, TrainingSession,
};
