use crate::error::PortalError;
use crate::types::{MemberId, Registration, SessionId, TrainingSession};

/// Sessions page actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingAction {
    // Commands
    /// Fetch upcoming sessions.
    LoadSessions,
    /// Open the confirmation dialog for a session.
    SelectSession {
        /// Session to book.
        session_id: SessionId,
    },
    /// Close the dialog without booking.
    CloseDialog,
    /// Book the selected session.
    ConfirmRegistration {
        /// Member making the booking.
        member_id: MemberId,
    },
    /// Clear the banner.
    DismissBanner,

    // Results
    /// Sessions fetched.
    SessionsLoaded {
        /// Upcoming sessions.
        sessions: Vec<TrainingSession>,
    },
    /// Session fetch failed.
    SessionsFailed {
        /// Cause.
        error: PortalError,
    },
    /// Registration stored.
    RegistrationSucceeded {
        /// Stored registration.
        registration: Registration,
    },
    /// Registration write failed.
    RegistrationFailed {
        /// Cause.
        error: PortalError,
    },
    /// Transient banner timed out.
    ExpireBanner {
        /// Banner sequence number it was scheduled for.
        seq: u64,
    },
}

impl BookingAction {
    /// `true` for actions that end a load or registration.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SessionsLoaded { .. }
                | Self::SessionsFailed { .. }
                | Self::RegistrationSucceeded { .. }
                | Self::RegistrationFailed { .. }
        )
    }
}
