//! One client's portal: identity state plus the account and booking stores.
//!
//! [`Portal`] wires a [`Backend`] into the workflows and exposes the
//! operations a front end needs: navigation checks against the cached
//! identity state, the page view models, and request helpers that send an
//! action and wait for its result.

use crate::account::{AccountAction, AccountEnvironment, AccountReducer, AccountState, Credentials};
use crate::auth_state::{AuthSnapshot, AuthState};
use crate::booking::{self, BookingAction, BookingEnvironment, BookingReducer, BookingState};
use crate::error::{PortalError, ProviderError, Result};
use crate::navigation::{navigate, Navigation, View};
use crate::providers::{Backend, ProfileStore};
use crate::types::{Member, ProfileChanges, SessionId};
use crate::validation::RegistrationForm;
use crate::views::{
    AdminView, DashboardView, LoginView, NavBar, ProfileView, RegisterView, SessionsView,
};
use clubhouse_core::environment::Clock;
use clubhouse_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;

/// Account store for a backend.
pub type AccountStore<B> = Store<
    AccountState,
    AccountAction,
    AccountEnvironment<<B as Backend>::Gateway, <B as Backend>::Profiles>,
    AccountReducer<<B as Backend>::Gateway, <B as Backend>::Profiles>,
>;

/// Booking store for a backend.
pub type BookingStore<B> = Store<
    BookingState,
    BookingAction,
    BookingEnvironment<<B as Backend>::Profiles>,
    BookingReducer<<B as Backend>::Profiles>,
>;

/// Tunables for a portal client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalSettings {
    /// Success banner lifetime; `None` keeps banners until dismissed.
    pub banner_ttl: Option<Duration>,
    /// How long a request waits for its result action.
    pub request_timeout: Duration,
    /// How long account effects wait for identity state to resolve.
    pub settle_timeout: Duration,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            banner_ttl: Some(Duration::from_secs(6)),
            request_timeout: Duration::from_secs(15),
            settle_timeout: crate::account::DEFAULT_SETTLE_TIMEOUT,
        }
    }
}

/// A running portal client.
pub struct Portal<B: Backend> {
    auth: Arc<AuthState>,
    account: AccountStore<B>,
    booking: BookingStore<B>,
    profiles: B::Profiles,
    clock: Arc<dyn Clock>,
    settings: PortalSettings,
}

impl<B: Backend> Portal<B> {
    /// Build the stores and start the identity listener.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn start(backend: &B, clock: Arc<dyn Clock>, settings: PortalSettings) -> Self {
        let auth = Arc::new(AuthState::new());
        let profiles = backend.profiles(auth.identity_receiver());
        auth.start(profiles.clone());

        let mut account_env = AccountEnvironment::new(
            backend.gateway(),
            profiles.clone(),
            Arc::clone(&auth),
            Arc::clone(&clock),
        );
        account_env.settle_timeout = settings.settle_timeout;
        let account = Store::new(AccountState::default(), AccountReducer::new(), account_env);

        let booking_env = BookingEnvironment::new(profiles.clone(), Arc::clone(&clock))
            .with_banner_ttl(settings.banner_ttl);
        let booking = Store::new(BookingState::default(), BookingReducer::new(), booking_env);

        tracing::debug!("portal client started");
        Self {
            auth,
            account,
            booking,
            profiles,
            clock,
            settings,
        }
    }

    /// Identity state.
    #[must_use]
    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Cached identity snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.auth.current()
    }

    /// Account store.
    #[must_use]
    pub const fn account(&self) -> &AccountStore<B> {
        &self.account
    }

    /// Booking store.
    #[must_use]
    pub const fn booking(&self) -> &BookingStore<B> {
        &self.booking
    }

    /// Route a navigation using the cached access level only.
    #[must_use]
    pub fn navigate(&self, view: View) -> Navigation {
        navigate(view, self.auth.current().access)
    }

    /// Wait until the identity state has resolved at least once.
    pub async fn ready(&self) -> AuthSnapshot {
        self.auth
            .wait_until(|s| !s.loading, self.settings.request_timeout)
            .await
            .unwrap_or_else(|| self.auth.current())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Requests
    // ═══════════════════════════════════════════════════════════════════

    /// Submit the registration form and wait for the outcome.
    ///
    /// # Errors
    ///
    /// Validation or provider errors, or a runtime timeout.
    pub async fn register(&self, form: RegistrationForm) -> Result<Member> {
        match self
            .account_request(AccountAction::SubmitRegistration { form })
            .await?
        {
            AccountAction::Registered { member } => Ok(member),
            other => Err(failure(&other)),
        }
    }

    /// Sign in and wait for the identity state to resolve.
    ///
    /// # Errors
    ///
    /// Invalid credentials, provider errors or a runtime timeout.
    pub async fn login(&self, credentials: Credentials) -> Result<AuthSnapshot> {
        match self
            .account_request(AccountAction::SubmitLogin { credentials })
            .await?
        {
            AccountAction::LoggedIn { .. } => Ok(self.auth.current()),
            other => Err(failure(&other)),
        }
    }

    /// Sign out.
    ///
    /// # Errors
    ///
    /// Provider errors or a runtime timeout.
    pub async fn logout(&self) -> Result<()> {
        match self.account_request(AccountAction::Logout).await? {
            AccountAction::LoggedOut => Ok(()),
            other => Err(failure(&other)),
        }
    }

    /// Send a password reset email.
    ///
    /// # Errors
    ///
    /// Validation or provider errors, or a runtime timeout.
    pub async fn request_password_reset(&self, email: String) -> Result<()> {
        match self
            .account_request(AccountAction::RequestPasswordReset { email })
            .await?
        {
            AccountAction::PasswordResetSent { .. } => Ok(()),
            other => Err(failure(&other)),
        }
    }

    /// Edit the signed-in member's profile.
    ///
    /// # Errors
    ///
    /// Validation or provider errors, a missing profile, or a runtime timeout.
    pub async fn update_profile(&self, changes: ProfileChanges) -> Result<Member> {
        match self
            .account_request(AccountAction::UpdateProfile { changes })
            .await?
        {
            AccountAction::ProfileUpdated { member } => Ok(member),
            other => Err(failure(&other)),
        }
    }

    /// Reload the session list and return the sessions page.
    ///
    /// A provider failure is not an error here: the page shows the error
    /// banner and an empty list.
    ///
    /// # Errors
    ///
    /// Only runtime errors.
    pub async fn load_sessions(&self) -> Result<SessionsView> {
        self.booking
            .send_and_wait_for(
                BookingAction::LoadSessions,
                |action| {
                    matches!(
                        action,
                        BookingAction::SessionsLoaded { .. } | BookingAction::SessionsFailed { .. }
                    )
                },
                self.settings.request_timeout,
            )
            .await?;
        Ok(self.sessions_view().await)
    }

    /// Select a session and confirm a registration for the signed-in member.
    ///
    /// The session must be in the loaded list. The page state (banner,
    /// dialog) is returned whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Unauthenticated`] when nobody is signed in
    /// - [`ProviderError::NotFound`] when the session is not listed
    /// - [`StoreError::NoResult`] when a confirm is already in flight
    pub async fn book_session(&self, session_id: SessionId) -> Result<SessionsView> {
        let member_id = self
            .auth
            .current()
            .member_id()
            .cloned()
            .ok_or(ProviderError::Unauthenticated)?;

        let listed = self
            .booking
            .state(|state| state.session(&session_id).is_some())
            .await;
        if !listed {
            return Err(ProviderError::NotFound {
                collection: "sessions",
                id: session_id.to_string(),
            }
            .into());
        }

        self.booking
            .send(BookingAction::SelectSession { session_id })
            .await?;
        self.booking
            .send_and_wait_for(
                BookingAction::ConfirmRegistration { member_id },
                |action| {
                    matches!(
                        action,
                        BookingAction::RegistrationSucceeded { .. }
                            | BookingAction::RegistrationFailed { .. }
                    )
                },
                self.settings.request_timeout,
            )
            .await?;
        Ok(self.sessions_view().await)
    }

    /// Close the confirmation dialog.
    ///
    /// # Errors
    ///
    /// Runtime errors.
    pub async fn close_dialog(&self) -> Result<SessionsView> {
        self.booking.send(BookingAction::CloseDialog).await?;
        Ok(self.sessions_view().await)
    }

    /// Clear the sessions page banner.
    ///
    /// # Errors
    ///
    /// Runtime errors.
    pub async fn dismiss_banner(&self) -> Result<SessionsView> {
        self.booking.send(BookingAction::DismissBanner).await?;
        Ok(self.sessions_view().await)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Views
    // ═══════════════════════════════════════════════════════════════════

    /// Navbar for the current identity.
    #[must_use]
    pub fn nav_bar(&self) -> NavBar {
        let snapshot = self.auth.current();
        NavBar::build(
            snapshot.access,
            snapshot.identity.as_ref().map(|identity| identity.email.as_str()),
            snapshot.profile.as_ref(),
        )
    }

    /// Dashboard. A session fetch failure is logged and shows no sessions.
    pub async fn dashboard(&self) -> DashboardView {
        let today = self.clock.now().date_naive();
        let upcoming = match booking::list_upcoming(&self.profiles, today).await {
            Ok(sessions) => sessions,
            Err(error) => {
                tracing::error!(%error, "error loading sessions");
                Vec::new()
            },
        };
        DashboardView::build(self.auth.current().profile.as_ref(), &upcoming)
    }

    /// Sessions page from the current booking state.
    pub async fn sessions_view(&self) -> SessionsView {
        self.booking.state(SessionsView::build).await
    }

    /// Profile page of the signed-in member.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Unauthenticated`] or [`PortalError::ProfileNotFound`].
    pub fn profile_view(&self) -> Result<ProfileView> {
        let snapshot = self.auth.current();
        let identity = snapshot.identity.ok_or(ProviderError::Unauthenticated)?;
        snapshot
            .profile
            .as_ref()
            .map(ProfileView::build)
            .ok_or(PortalError::ProfileNotFound(identity.uid))
    }

    /// Admin panel: roster and registration counts for every session.
    ///
    /// # Errors
    ///
    /// Provider errors from any of the three listings.
    pub async fn admin_view(&self) -> Result<AdminView> {
        let (members, sessions, registrations) = tokio::try_join!(
            self.profiles.list_members(),
            self.profiles.list_sessions(),
            self.profiles.list_registrations(None),
        )?;
        let mut sessions = sessions;
        sessions.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(AdminView::build(&members, &sessions, &registrations))
    }

    /// Login page.
    pub async fn login_view(&self) -> LoginView {
        self.account.state(LoginView::build).await
    }

    /// Registration page.
    pub async fn register_view(&self) -> RegisterView {
        self.account.state(RegisterView::build).await
    }

    /// Stop the identity listener and drain both stores.
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownTimeout`] if effects are still running.
    pub async fn shutdown(&self, timeout: Duration) -> std::result::Result<(), StoreError> {
        self.auth.shutdown();
        let (account, booking) =
            tokio::join!(self.account.shutdown(timeout), self.booking.shutdown(timeout));
        account.and(booking)
    }

    /// Send an account command and wait for its own terminal action.
    ///
    /// A command the reducer drops (another is in flight) fails with
    /// [`StoreError::NoResult`].
    async fn account_request(&self, action: AccountAction) -> Result<AccountAction> {
        Ok(self
            .account
            .send_and_wait_for(
                action,
                AccountAction::is_terminal,
                self.settings.request_timeout,
            )
            .await?)
    }
}

fn failure(action: &AccountAction) -> PortalError {
    action
        .error()
        .cloned()
        .unwrap_or_else(|| ProviderError::Rejected(format!("unexpected result: {action:?}")).into())
}
