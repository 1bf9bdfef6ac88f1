use super::actions::BookingAction;
use super::state::{Banner, BookingState};
use super::{LOAD_FAILED_MESSAGE, REGISTERED_MESSAGE, REGISTER_FAILED_MESSAGE};
use crate::providers::ProfileStore;
use clubhouse_core::effect::Effect;
use clubhouse_core::environment::Clock;
use clubhouse_core::reducer::Reducer;
use clubhouse_core::{smallvec, Effects};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Dependencies of the booking reducer.
#[derive(Clone)]
pub struct BookingEnvironment<P> {
    /// Profile Store client.
    pub profiles: P,
    /// Clock for "upcoming" and registration timestamps.
    pub clock: Arc<dyn Clock>,
    /// How long a success banner stays up; `None` keeps it until dismissed.
    pub banner_ttl: Option<Duration>,
}

impl<P> BookingEnvironment<P> {
    /// Environment with sticky banners.
    #[must_use]
    pub fn new(profiles: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            profiles,
            clock,
            banner_ttl: None,
        }
    }

    /// Expire success banners after `ttl`.
    #[must_use]
    pub const fn with_banner_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.banner_ttl = ttl;
        self
    }
}

/// Reducer for the sessions page.
#[derive(Debug, Clone, Copy)]
pub struct BookingReducer<P> {
    _profiles: PhantomData<fn() -> P>,
}

impl<P> BookingReducer<P> {
    /// Create the reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _profiles: PhantomData,
        }
    }
}

impl<P> Default for BookingReducer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ProfileStore> Reducer for BookingReducer<P> {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment<P>;

    #[allow(clippy::too_many_lines)] // one arm per page event
    fn reduce(
        &self,
        state: &mut BookingState,
        action: BookingAction,
        env: &BookingEnvironment<P>,
    ) -> Effects<BookingAction> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Loading
            // ═══════════════════════════════════════════════════════════════
            BookingAction::LoadSessions => {
                state.loading = true;
                let profiles = env.profiles.clone();
                let today = env.clock.now().date_naive();

                smallvec![Effect::future(async move {
                    Some(match super::list_upcoming(&profiles, today).await {
                        Ok(sessions) => BookingAction::SessionsLoaded { sessions },
                        Err(error) => BookingAction::SessionsFailed {
                            error: error.into(),
                        },
                    })
                })]
            },

            BookingAction::SessionsLoaded { sessions } => {
                tracing::debug!(count = sessions.len(), "sessions loaded");
                state.sessions = sessions;
                state.loading = false;
                smallvec![Effect::None]
            },

            BookingAction::SessionsFailed { error } => {
                tracing::error!(%error, "error loading sessions");
                state.sessions.clear();
                state.loading = false;
                state.show_banner(Banner::error(LOAD_FAILED_MESSAGE));
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Dialog
            // ═══════════════════════════════════════════════════════════════
            BookingAction::SelectSession { session_id } => {
                let Some(session) = state.session(&session_id).cloned() else {
                    tracing::warn!(session = %session_id, "selected session is not listed");
                    return smallvec![Effect::None];
                };
                state.selected = Some(session);
                state.dialog_open = true;
                smallvec![Effect::None]
            },

            BookingAction::CloseDialog => {
                state.dialog_open = false;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Registration
            // ═══════════════════════════════════════════════════════════════
            BookingAction::ConfirmRegistration { member_id } => {
                if state.registering {
                    tracing::warn!(member = %member_id, "registration already in flight");
                    return smallvec![Effect::None];
                }
                let Some(session) = state.selected.as_ref() else {
                    tracing::warn!(member = %member_id, "confirm without a selected session");
                    return smallvec![Effect::None];
                };

                state.registering = true;
                let profiles = env.profiles.clone();
                let session_id = session.id.clone();
                let now = env.clock.now();

                smallvec![Effect::future(async move {
                    Some(
                        match super::register(&profiles, session_id, member_id, now).await {
                            Ok(registration) => {
                                BookingAction::RegistrationSucceeded { registration }
                            },
                            Err(error) => BookingAction::RegistrationFailed {
                                error: error.into(),
                            },
                        },
                    )
                })]
            },

            BookingAction::RegistrationSucceeded { registration: _ } => {
                state.registering = false;
                state.dialog_open = false;
                let seq = state.show_banner(Banner::success(REGISTERED_MESSAGE));

                match env.banner_ttl {
                    Some(duration) => smallvec![Effect::Delay {
                        duration,
                        action: Box::new(BookingAction::ExpireBanner { seq }),
                    }],
                    None => smallvec![Effect::None],
                }
            },

            BookingAction::RegistrationFailed { error } => {
                tracing::error!(%error, "registration error");
                metrics::counter!("clubhouse_registration_failures_total").increment(1);
                state.registering = false;
                state.show_banner(Banner::error(REGISTER_FAILED_MESSAGE));
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Banner
            // ═══════════════════════════════════════════════════════════════
            BookingAction::DismissBanner => {
                state.banner = None;
                smallvec![Effect::None]
            },

            BookingAction::ExpireBanner { seq } => {
                if state.banner_seq == seq {
                    state.banner = None;
                }
                smallvec![Effect::None]
            },
        }
    }
}
