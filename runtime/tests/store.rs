//! Integration tests for the Store runtime
//!
//! Exercises the request/response pattern used by the web shell: send a
//! command, wait for the provider result that the effect feeds back.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use clubhouse_core::{effect::Effect, reducer::Reducer, smallvec, Effects, SmallVec};
use clubhouse_runtime::{Store, StoreError};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum SignupAction {
    Submit { email: String },
    Accepted { email: String },
    Rejected { reason: String },
    Hang,
    Dismiss,
    ScheduleDismiss,
}

#[derive(Debug, Clone, Default)]
struct SignupState {
    in_flight: bool,
    accepted: Vec<String>,
    notice: Option<String>,
}

struct SignupReducer;

impl Reducer for SignupReducer {
    type State = SignupState;
    type Action = SignupAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> Effects<Self::Action> {
        match action {
            SignupAction::Submit { email } => {
                state.in_flight = true;
                smallvec![Effect::future(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    if email.contains('@') {
                        Some(SignupAction::Accepted { email })
                    } else {
                        Some(SignupAction::Rejected {
                            reason: "bad email".to_string(),
                        })
                    }
                })]
            },
            SignupAction::Accepted { email } => {
                state.in_flight = false;
                state.accepted.push(email);
                state.notice = Some("welcome".to_string());
                SmallVec::new()
            },
            SignupAction::Rejected { reason } => {
                state.in_flight = false;
                state.notice = Some(reason);
                SmallVec::new()
            },
            SignupAction::Hang => smallvec![Effect::future(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                None
            })],
            SignupAction::ScheduleDismiss => smallvec![Effect::Delay {
                duration: Duration::from_millis(5),
                action: Box::new(SignupAction::Dismiss),
            }],
            SignupAction::Dismiss => {
                state.notice = None;
                smallvec![Effect::None]
            },
        }
    }
}

fn store() -> Store<SignupState, SignupAction, (), SignupReducer> {
    Store::new(SignupState::default(), SignupReducer, ())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn handle_waits_for_feedback_cascade() {
    let store = store();

    let mut handle = store
        .send(SignupAction::Submit {
            email: "setter@club.test".to_string(),
        })
        .await
        .unwrap();
    handle.wait().await;

    let state = store.state(Clone::clone).await;
    assert!(!state.in_flight);
    assert_eq!(state.accepted, vec!["setter@club.test".to_string()]);
    assert_eq!(handle.pending(), 0);
}

#[tokio::test]
async fn send_and_wait_for_returns_terminal_action() {
    let store = store();

    let result = store
        .send_and_wait_for(
            SignupAction::Submit {
                email: "no-at-sign".to_string(),
            },
            |a| matches!(a, SignupAction::Accepted { .. } | SignupAction::Rejected { .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        SignupAction::Rejected {
            reason: "bad email".to_string()
        }
    );
}

#[tokio::test]
async fn send_and_wait_for_times_out() {
    let store = store();

    let result = store
        .send_and_wait_for(
            SignupAction::Hang,
            |a| matches!(a, SignupAction::Accepted { .. }),
            Duration::from_millis(20),
        )
        .await;

    assert_eq!(assert_err!(result), StoreError::Timeout);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn result_is_applied_before_wait_returns() {
    let store = store();

    for round in 0..200 {
        let email = format!("player{round}@club.test");
        let result = store
            .send_and_wait_for(
                SignupAction::Submit { email: email.clone() },
                |a| matches!(a, SignupAction::Accepted { .. }),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(result, SignupAction::Accepted { email: email.clone() });

        let (in_flight, last) = store
            .state(|s| (s.in_flight, s.accepted.last().cloned()))
            .await;
        assert!(!in_flight, "round {round} read state before the result");
        assert_eq!(last, Some(email));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_waits_receive_their_own_results() {
    let store = store();
    let wait = |email: &str| {
        store.send_and_wait_for(
            SignupAction::Submit {
                email: email.to_string(),
            },
            |a| matches!(a, SignupAction::Accepted { .. } | SignupAction::Rejected { .. }),
            Duration::from_secs(1),
        )
    };

    let (outside, middle) = tokio::join!(wait("outside@club.test"), wait("middle"));

    assert_eq!(
        outside.unwrap(),
        SignupAction::Accepted {
            email: "outside@club.test".to_string()
        }
    );
    assert_eq!(
        middle.unwrap(),
        SignupAction::Rejected {
            reason: "bad email".to_string()
        }
    );
}

#[tokio::test]
async fn ignored_action_reports_no_result() {
    let store = store();

    let result = store
        .send_and_wait_for(
            SignupAction::Dismiss,
            |a| matches!(a, SignupAction::Accepted { .. }),
            Duration::from_secs(5),
        )
        .await;

    assert_eq!(assert_err!(result), StoreError::NoResult);
}

#[tokio::test]
async fn unmatched_feedback_reports_no_result() {
    let store = store();

    let result = store
        .send_and_wait_for(
            SignupAction::Submit {
                email: "middle".to_string(),
            },
            |a| matches!(a, SignupAction::Accepted { .. }),
            Duration::from_secs(5),
        )
        .await;

    assert_eq!(assert_err!(result), StoreError::NoResult);
}

#[tokio::test]
async fn delayed_action_is_dispatched() {
    let store = store();
    store
        .send(SignupAction::Accepted {
            email: "libero@club.test".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(store.state(|s| s.notice.clone()).await.as_deref(), Some("welcome"));

    let mut handle = store.send(SignupAction::ScheduleDismiss).await.unwrap();
    assert_ok!(handle.wait_with_timeout(Duration::from_secs(1)).await);

    assert!(store.state(|s| s.notice.is_none()).await);
}

#[tokio::test]
async fn shutdown_rejects_new_actions() {
    let store = store();
    assert_ok!(store.shutdown(Duration::from_millis(50)).await);

    assert!(store.is_shutting_down());
    let result = store.send(SignupAction::Dismiss).await;
    assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
}

#[tokio::test]
async fn shutdown_reports_hung_effects() {
    let store = store();
    store.send(SignupAction::Hang).await.unwrap();

    let result = store.shutdown(Duration::from_millis(20)).await;
    assert_eq!(result, Err(StoreError::ShutdownTimeout(1)));
}

#[tokio::test]
async fn completed_handle_does_not_block() {
    let mut handle = clubhouse_runtime::EffectHandle::completed();
    handle.wait().await;
    assert_eq!(handle.pending(), 0);
}
