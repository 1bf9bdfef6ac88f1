use super::actions::AccountAction;
use super::state::AccountState;
use crate::auth_state::AuthState;
use crate::error::ValidationError;
use crate::providers::{IdentityGateway, ProfileStore};
use crate::validation::{check_email, check_profile_changes};
use clubhouse_core::effect::Effect;
use clubhouse_core::environment::Clock;
use clubhouse_core::reducer::Reducer;
use clubhouse_core::{smallvec, Effects};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// How long account effects wait for the identity state to catch up.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

// Local failures still end with a result action, without touching a provider.
fn settled(action: AccountAction) -> Effects<AccountAction> {
    smallvec![Effect::future(async move { Some(action) })]
}

/// Dependencies of the account reducer.
#[derive(Clone)]
pub struct AccountEnvironment<G, P> {
    /// Identity Gateway client.
    pub gateway: G,
    /// Profile Store client.
    pub profiles: P,
    /// Identity state the workflow publishes to.
    pub auth: Arc<AuthState>,
    /// Clock for join dates.
    pub clock: Arc<dyn Clock>,
    /// Bound on waiting for identity state after a change.
    pub settle_timeout: Duration,
}

impl<G, P> AccountEnvironment<G, P> {
    /// Environment with the default settle timeout.
    #[must_use]
    pub fn new(gateway: G, profiles: P, auth: Arc<AuthState>, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            profiles,
            auth,
            clock,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
        }
    }
}

/// Reducer for the account forms.
#[derive(Debug, Clone, Copy)]
pub struct AccountReducer<G, P> {
    _providers: PhantomData<fn() -> (G, P)>,
}

impl<G, P> AccountReducer<G, P> {
    /// Create the reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _providers: PhantomData,
        }
    }
}

impl<G, P> Default for AccountReducer<G, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G, P> Reducer for AccountReducer<G, P>
where
    G: IdentityGateway,
    P: ProfileStore,
{
    type State = AccountState;
    type Action = AccountAction;
    type Environment = AccountEnvironment<G, P>;

    #[allow(clippy::too_many_lines)] // one arm per form event
    fn reduce(
        &self,
        state: &mut AccountState,
        action: AccountAction,
        env: &AccountEnvironment<G, P>,
    ) -> Effects<AccountAction> {
        // Submissions are dropped while another request is in flight.
        let submission = matches!(
            action,
            AccountAction::SubmitRegistration { .. }
                | AccountAction::SubmitLogin { .. }
                | AccountAction::Logout
                | AccountAction::RequestPasswordReset { .. }
                | AccountAction::UpdateProfile { .. }
        );
        if submission && state.in_flight {
            tracing::warn!("account request already in flight");
            return smallvec![Effect::None];
        }

        match action {
            // ═══════════════════════════════════════════════════════════════
            // Registration
            // ═══════════════════════════════════════════════════════════════
            AccountAction::SubmitRegistration { form } => {
                let registration = match form.validate() {
                    Ok(registration) => registration,
                    Err(error) => {
                        return settled(AccountAction::RegistrationRejected {
                            error: error.into(),
                        });
                    },
                };

                state.begin();
                let gateway = env.gateway.clone();
                let profiles = env.profiles.clone();
                let auth = Arc::clone(&env.auth);
                let joined_at = env.clock.now();
                let settle = env.settle_timeout;

                smallvec![Effect::future(async move {
                    Some(
                        match super::register_member(
                            &gateway,
                            &profiles,
                            &auth,
                            registration,
                            joined_at,
                            settle,
                        )
                        .await
                        {
                            Ok(member) => AccountAction::Registered { member },
                            Err(error) => AccountAction::RegistrationRejected { error },
                        },
                    )
                })]
            },

            AccountAction::Registered { member } => {
                tracing::debug!(member = %member.id, "registration complete");
                state.finish(None);
                smallvec![Effect::None]
            },

            AccountAction::RegistrationRejected { error } => {
                tracing::warn!(%error, "registration rejected");
                state.fail(&error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Login / logout
            // ═══════════════════════════════════════════════════════════════
            AccountAction::SubmitLogin { credentials } => {
                if let Err(error) = check_email(&credentials.email) {
                    return settled(AccountAction::LoginFailed {
                        error: error.into(),
                    });
                }

                state.begin();
                let gateway = env.gateway.clone();
                let auth = Arc::clone(&env.auth);
                let settle = env.settle_timeout;

                smallvec![Effect::future(async move {
                    Some(
                        match super::sign_in(&gateway, &auth, &credentials, settle).await {
                            Ok((member_id, access)) => {
                                AccountAction::LoggedIn { member_id, access }
                            },
                            Err(error) => AccountAction::LoginFailed { error },
                        },
                    )
                })]
            },

            AccountAction::LoggedIn { member_id, access } => {
                metrics::counter!("clubhouse_logins_total").increment(1);
                tracing::info!(member = %member_id, ?access, "member signed in");
                state.finish(None);
                smallvec![Effect::None]
            },

            AccountAction::LoginFailed { error } => {
                metrics::counter!("clubhouse_login_failures_total").increment(1);
                tracing::warn!(%error, "sign-in failed");
                state.fail(&error);
                smallvec![Effect::None]
            },

            AccountAction::Logout => {
                state.begin();
                let gateway = env.gateway.clone();
                let auth = Arc::clone(&env.auth);
                let settle = env.settle_timeout;

                smallvec![Effect::future(async move {
                    Some(match super::sign_out(&gateway, &auth, settle).await {
                        Ok(()) => AccountAction::LoggedOut,
                        Err(error) => AccountAction::LogoutFailed { error },
                    })
                })]
            },

            AccountAction::LoggedOut => {
                tracing::info!("member signed out");
                state.finish(None);
                smallvec![Effect::None]
            },

            AccountAction::LogoutFailed { error } => {
                tracing::error!(%error, "sign-out failed");
                state.fail(&error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Password reset
            // ═══════════════════════════════════════════════════════════════
            AccountAction::RequestPasswordReset { email } => {
                let email = email.trim().to_string();
                if let Err(error) = check_email(&email) {
                    return settled(AccountAction::PasswordResetFailed {
                        error: error.into(),
                    });
                }

                state.begin();
                let gateway = env.gateway.clone();

                smallvec![Effect::future(async move {
                    Some(match gateway.reset_password(&email).await {
                        Ok(()) => AccountAction::PasswordResetSent { email },
                        Err(error) => AccountAction::PasswordResetFailed {
                            error: error.into(),
                        },
                    })
                })]
            },

            AccountAction::PasswordResetSent { email } => {
                metrics::counter!("clubhouse_password_resets_total").increment(1);
                state.finish(Some(format!("Password reset email sent to {email}")));
                smallvec![Effect::None]
            },

            AccountAction::PasswordResetFailed { error } => {
                tracing::warn!(%error, "password reset failed");
                state.fail(&error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Profile
            // ═══════════════════════════════════════════════════════════════
            AccountAction::UpdateProfile { changes } => {
                if let Err(error) = check_profile_changes(&changes) {
                    return settled(AccountAction::ProfileUpdateFailed {
                        error: error.into(),
                    });
                }
                if changes.is_empty() {
                    return settled(AccountAction::ProfileUpdateFailed {
                        error: ValidationError::MissingField {
                            field: "Profile changes",
                        }
                        .into(),
                    });
                }

                state.begin();
                let gateway = env.gateway.clone();
                let profiles = env.profiles.clone();
                let auth = Arc::clone(&env.auth);
                let settle = env.settle_timeout;

                smallvec![Effect::future(async move {
                    Some(
                        match super::update_profile(&gateway, &profiles, &auth, changes, settle)
                            .await
                        {
                            Ok(member) => AccountAction::ProfileUpdated { member },
                            Err(error) => AccountAction::ProfileUpdateFailed { error },
                        },
                    )
                })]
            },

            AccountAction::ProfileUpdated { member } => {
                tracing::info!(member = %member.id, "profile updated");
                state.finish(Some("Profile updated".to_string()));
                smallvec![Effect::None]
            },

            AccountAction::ProfileUpdateFailed { error } => {
                tracing::warn!(%error, "profile update failed");
                state.fail(&error);
                smallvec![Effect::None]
            },

            AccountAction::DismissError => {
                state.error = None;
                state.notice = None;
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account::Credentials;
    use crate::mocks::{fixtures, MockIdentityGateway, MockProfileStore};
    use crate::navigation::Access;
    use crate::types::{MembershipTier, ProfileChanges, Role};
    use crate::validation::RegistrationForm;
    use clubhouse_testing::{assertions, collect_actions, test_clock, ReducerTest};

    type Env = AccountEnvironment<MockIdentityGateway, MockProfileStore>;

    struct Harness {
        gateway: MockIdentityGateway,
        store: MockProfileStore,
        env: Env,
    }

    fn harness() -> Harness {
        let gateway = MockIdentityGateway::new();
        let store = MockProfileStore::new();
        let auth = Arc::new(AuthState::new());
        auth.start(store.clone());
        let env = AccountEnvironment::new(
            gateway.clone(),
            store.clone(),
            auth,
            Arc::new(test_clock()),
        );
        Harness {
            gateway,
            store,
            env,
        }
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            email: "robin@club.test".to_string(),
            password: "blocker7".to_string(),
            confirm_password: "blocker7".to_string(),
            first_name: "Robin".to_string(),
            last_name: "Shaw".to_string(),
            membership_type: MembershipTier::Student,
            ..RegistrationForm::default()
        }
    }

    /// Reduce `action`, run its effects and reduce the results.
    async fn run(env: &Env, state: &mut AccountState, action: AccountAction) -> Vec<AccountAction> {
        let reducer = AccountReducer::new();
        let effects = reducer.reduce(state, action, env);
        let results = collect_actions(effects).await;
        for result in results.clone() {
            reducer.reduce(state, result, env);
        }
        results
    }

    #[tokio::test]
    async fn mismatched_passwords_never_reach_gateway() {
        let h = harness();
        let mut state = AccountState::default();
        let mut input = form();
        input.confirm_password = "blocker8".to_string();

        run(&h.env, &mut state, AccountAction::SubmitRegistration { form: input }).await;

        assert_eq!(state.error.as_deref(), Some("Passwords do not match"));
        assert!(!state.in_flight);
        assert_eq!(h.gateway.calls().total(), 0);
        assert_eq!(h.store.calls().put_member, 0);
    }

    #[tokio::test]
    async fn short_password_never_reaches_gateway() {
        let h = harness();
        let mut state = AccountState::default();
        let mut input = form();
        input.password = "abc12".to_string();
        input.confirm_password = "abc12".to_string();

        run(&h.env, &mut state, AccountAction::SubmitRegistration { form: input }).await;

        assert_eq!(
            state.error.as_deref(),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(h.gateway.calls().register, 0);
    }

    #[tokio::test]
    async fn registration_creates_member_profile() {
        let h = harness();
        let mut state = AccountState::default();

        let results =
            run(&h.env, &mut state, AccountAction::SubmitRegistration { form: form() }).await;

        let [AccountAction::Registered { member }] = results.as_slice() else {
            unreachable!("unexpected results: {results:?}");
        };
        assert_eq!(member.role, Some(Role::Member));
        assert!(member.is_active);
        assert_eq!(member.membership_type, MembershipTier::Student);
        assert_eq!(member.join_date, test_clock().now());
        assert_eq!(h.store.member(&member.id).as_ref(), Some(member));
        assert_eq!(
            h.gateway.display_name("robin@club.test").as_deref(),
            Some("Robin Shaw")
        );

        let snapshot = h.env.auth.current();
        assert_eq!(snapshot.access, Access::Member);
        assert_eq!(snapshot.profile.as_ref(), Some(member));
        assert!(!state.in_flight);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let h = harness();
        h.gateway.seed_account("uid-x", "robin@club.test", "whatever1");
        let mut state = AccountState::default();

        run(&h.env, &mut state, AccountAction::SubmitRegistration { form: form() }).await;

        assert_eq!(
            state.error.as_deref(),
            Some("An account with this email already exists")
        );
        assert_eq!(h.store.calls().put_member, 0);
    }

    #[tokio::test]
    async fn login_resolves_admin_access() {
        let h = harness();
        h.gateway.seed_account("uid-admin", "coach@club.test", "captain1");
        h.store.insert_member(fixtures::member("uid-admin", Some(Role::Admin)));
        let mut state = AccountState::default();

        let results = run(
            &h.env,
            &mut state,
            AccountAction::SubmitLogin {
                credentials: Credentials {
                    email: "coach@club.test".to_string(),
                    password: "captain1".to_string(),
                },
            },
        )
        .await;

        assert!(matches!(
            results.as_slice(),
            [AccountAction::LoggedIn { access: Access::Admin, .. }]
        ));
        assert_eq!(h.env.auth.current().access, Access::Admin);
    }

    #[tokio::test]
    async fn bad_credentials_show_inline_error() {
        let h = harness();
        h.gateway.seed_account("uid-1", "jo@club.test", "libero01");
        let mut state = AccountState::default();

        run(
            &h.env,
            &mut state,
            AccountAction::SubmitLogin {
                credentials: Credentials {
                    email: "jo@club.test".to_string(),
                    password: "nope".to_string(),
                },
            },
        )
        .await;

        assert_eq!(state.error.as_deref(), Some("Invalid email or password"));
        assert_eq!(h.env.auth.current().access, Access::Unauthenticated);
    }

    #[test]
    fn submissions_dropped_while_in_flight() {
        let h = idle_env();
        ReducerTest::new(AccountReducer::new())
            .with_env(h)
            .given_state(AccountState {
                in_flight: true,
                ..AccountState::default()
            })
            .when_action(AccountAction::Logout)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    fn idle_env() -> Env {
        AccountEnvironment::new(
            MockIdentityGateway::new(),
            MockProfileStore::new(),
            Arc::new(AuthState::new()),
            Arc::new(test_clock()),
        )
    }

    #[tokio::test]
    async fn logout_clears_identity() {
        let h = harness();
        h.gateway.seed_account("uid-1", "jo@club.test", "libero01");
        h.store.insert_member(fixtures::member("uid-1", None));
        let mut state = AccountState::default();
        run(
            &h.env,
            &mut state,
            AccountAction::SubmitLogin {
                credentials: Credentials {
                    email: "jo@club.test".to_string(),
                    password: "libero01".to_string(),
                },
            },
        )
        .await;

        let results = run(&h.env, &mut state, AccountAction::Logout).await;

        assert_eq!(results, vec![AccountAction::LoggedOut]);
        assert_eq!(h.gateway.calls().logout, 1);
        let snapshot = h.env.auth.current();
        assert_eq!(snapshot.access, Access::Unauthenticated);
        assert!(snapshot.identity.is_none());
    }

    #[tokio::test]
    async fn password_reset_sets_notice() {
        let h = harness();
        h.gateway.seed_account("uid-1", "jo@club.test", "libero01");
        let mut state = AccountState::default();

        run(
            &h.env,
            &mut state,
            AccountAction::RequestPasswordReset {
                email: " jo@club.test ".to_string(),
            },
        )
        .await;

        assert_eq!(
            state.notice.as_deref(),
            Some("Password reset email sent to jo@club.test")
        );
        assert_eq!(h.gateway.reset_requests(), vec!["jo@club.test".to_string()]);
    }

    #[tokio::test]
    async fn profile_edit_rewrites_document_and_display_name() {
        let h = harness();
        h.gateway.seed_account("uid-1", "uid-1@club.test", "libero01");
        h.store.insert_member(fixtures::member("uid-1", None));
        h.env.auth.set_identity(fixtures::identity("uid-1"));
        let mut state = AccountState::default();

        let results = run(
            &h.env,
            &mut state,
            AccountAction::UpdateProfile {
                changes: ProfileChanges {
                    first_name: Some("Jordy".to_string()),
                    membership_type: Some(MembershipTier::Casual),
                    ..ProfileChanges::default()
                },
            },
        )
        .await;

        assert!(matches!(results.as_slice(), [AccountAction::ProfileUpdated { .. }]));
        let stored = h.store.member(&"uid-1".into()).unwrap();
        assert_eq!(stored.first_name, "Jordy");
        assert_eq!(stored.membership_type, MembershipTier::Casual);
        assert_eq!(
            h.gateway.display_name("uid-1@club.test").as_deref(),
            Some("Jordy Price")
        );
        assert_eq!(state.notice.as_deref(), Some("Profile updated"));
    }

    #[tokio::test]
    async fn profile_edit_without_profile_document() {
        let h = harness();
        h.env.auth.set_identity(fixtures::identity("uid-ghost"));
        let mut state = AccountState::default();

        run(
            &h.env,
            &mut state,
            AccountAction::UpdateProfile {
                changes: ProfileChanges {
                    phone: Some("0".to_string()),
                    ..ProfileChanges::default()
                },
            },
        )
        .await;

        assert_eq!(state.error.as_deref(), Some("User profile not found"));
    }
}
