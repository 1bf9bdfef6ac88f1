use crate::error::PortalError;
use crate::navigation::Access;
use crate::types::{Member, MemberId, ProfileChanges};
use crate::validation::RegistrationForm;
use serde::Deserialize;
use std::fmt;

/// Email and password from the login form.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Account actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountAction {
    // Registration
    /// Validate the form and create the account.
    SubmitRegistration {
        /// Raw form input.
        form: RegistrationForm,
    },
    /// Account and profile created.
    Registered {
        /// Stored profile.
        member: Member,
    },
    /// Registration failed, locally or at a provider.
    RegistrationRejected {
        /// Cause.
        error: PortalError,
    },

    // Login
    /// Sign in.
    SubmitLogin {
        /// Login form input.
        credentials: Credentials,
    },
    /// Signed in and identity state resolved.
    LoggedIn {
        /// Signed-in member.
        member_id: MemberId,
        /// Resolved access level.
        access: Access,
    },
    /// Sign-in failed.
    LoginFailed {
        /// Cause.
        error: PortalError,
    },

    // Logout
    /// Sign out.
    Logout,
    /// Signed out.
    LoggedOut,
    /// Sign-out failed.
    LogoutFailed {
        /// Cause.
        error: PortalError,
    },

    // Password reset
    /// Send a reset email.
    RequestPasswordReset {
        /// Account email.
        email: String,
    },
    /// Reset email sent.
    PasswordResetSent {
        /// Account email.
        email: String,
    },
    /// Reset failed.
    PasswordResetFailed {
        /// Cause.
        error: PortalError,
    },

    // Profile
    /// Edit the signed-in member's profile.
    UpdateProfile {
        /// Fields to change.
        changes: ProfileChanges,
    },
    /// Profile rewritten.
    ProfileUpdated {
        /// Stored profile.
        member: Member,
    },
    /// Profile edit failed.
    ProfileUpdateFailed {
        /// Cause.
        error: PortalError,
    },

    /// Clear the inline error and notice.
    DismissError,
}

impl AccountAction {
    /// `true` for actions that end a submitted request.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Registered { .. }
                | Self::RegistrationRejected { .. }
                | Self::LoggedIn { .. }
                | Self::LoginFailed { .. }
                | Self::LoggedOut
                | Self::LogoutFailed { .. }
                | Self::PasswordResetSent { .. }
                | Self::PasswordResetFailed { .. }
                | Self::ProfileUpdated { .. }
                | Self::ProfileUpdateFailed { .. }
        )
    }

    /// The error carried by a failure action.
    #[must_use]
    pub const fn error(&self) -> Option<&PortalError> {
        match self {
            Self::RegistrationRejected { error }
            | Self::LoginFailed { error }
            | Self::LogoutFailed { error }
            | Self::PasswordResetFailed { error }
            | Self::ProfileUpdateFailed { error } => Some(error),
            _ => None,
        }
    }
}
