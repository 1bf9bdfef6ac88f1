use crate::types::{SessionId, TrainingSession};
use serde::Serialize;

/// Banner severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    /// Green banner.
    Success,
    /// Red banner.
    Error,
}

/// Message shown above the session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    /// Severity.
    pub kind: BannerKind,
    /// Text.
    pub text: String,
}

impl Banner {
    /// Success banner.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            text: text.into(),
        }
    }

    /// Error banner.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            text: text.into(),
        }
    }
}

/// Sessions page state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingState {
    /// Upcoming sessions, in display order.
    pub sessions: Vec<TrainingSession>,
    /// A session fetch is in flight.
    pub loading: bool,
    /// Session shown in the confirmation dialog.
    pub selected: Option<TrainingSession>,
    /// Whether the confirmation dialog is open.
    pub dialog_open: bool,
    /// A registration write is in flight.
    pub registering: bool,
    /// Current banner.
    pub banner: Option<Banner>,
    /// Incremented whenever a banner is set; expiry only clears a matching one.
    #[serde(skip)]
    pub banner_seq: u64,
}

impl Default for BookingState {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            loading: true,
            selected: None,
            dialog_open: false,
            registering: false,
            banner: None,
            banner_seq: 0,
        }
    }
}

impl BookingState {
    /// Session by id.
    #[must_use]
    pub fn session(&self, id: &SessionId) -> Option<&TrainingSession> {
        self.sessions.iter().find(|session| &session.id == id)
    }

    pub(crate) fn show_banner(&mut self, banner: Banner) -> u64 {
        self.banner_seq += 1;
        self.banner = Some(banner);
        self.banner_seq
    }
}
