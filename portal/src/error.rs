//! Error types for the portal workflows.
//!
//! Three layers:
//! - [`ValidationError`]: local form checks, never reaches a provider
//! - [`ProviderError`]: failures reported by the Identity Gateway or Profile Store
//! - [`PortalError`]: what a workflow surfaces to the member

use crate::types::MemberId;
use clubhouse_runtime::StoreError;
use thiserror::Error;

/// Registration form validation failure.
///
/// The `Display` text is the message shown on the registration page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was left blank.
    #[error("{field} is required")]
    MissingField {
        /// Human-readable field name.
        field: &'static str,
    },

    /// Email is not shaped like an address.
    #[error("Please enter a valid email address")]
    InvalidEmail,

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Password is shorter than the minimum.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length in characters.
        min: usize,
    },
}

/// Failure reported by an external provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Email/password pair rejected.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Registration with an email that already has an account.
    #[error("An account with this email already exists")]
    EmailAlreadyInUse,

    /// Gateway rejected the password as too weak.
    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    /// Document does not exist.
    #[error("{collection}/{id} not found")]
    NotFound {
        /// Collection name.
        collection: &'static str,
        /// Document id.
        id: String,
    },

    /// Request needs a signed-in identity and none is present.
    #[error("Not signed in")]
    Unauthenticated,

    /// Provider could not be reached or answered with a server error.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Provider refused the request for another reason.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl ProviderError {
    /// `true` for a missing document.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Error surfaced by a portal workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    /// Form validation failed; no provider was contacted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The identity exists but has no profile document.
    #[error("User profile not found")]
    ProfileNotFound(MemberId),

    /// A workflow store rejected the action or did not answer in time.
    #[error(transparent)]
    Runtime(#[from] StoreError),
}

/// Result alias for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result alias for portal workflows.
pub type Result<T> = std::result::Result<T, PortalError>;
