//! Account endpoints: register, login, logout, password reset.
//!
//! Register and login each start a new portal client; on success it is
//! filed in the session registry and its token returned. A failed attempt
//! discards the client.

use crate::error::AppError;
use crate::extractors::{ClientSession, CorrelationId};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use clubhouse_portal::account::Credentials;
use clubhouse_portal::validation::RegistrationForm;
use clubhouse_portal::{Access, Backend, MemberId, View};
use serde::{Deserialize, Serialize};

/// Body returned after register or login.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Signed-in member.
    pub member_id: MemberId,
    /// Resolved access level.
    pub access: Access,
    /// Where the client should go next.
    pub redirect: String,
}

/// Password reset request body.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    /// Account email.
    pub email: String,
}

/// Password reset acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct Notice {
    /// Text to show the member.
    pub notice: String,
}

/// Create an account and sign it in.
///
/// ```text
/// POST /api/auth/register
/// {"email": "...", "password": "...", "confirmPassword": "...", "firstName": "...", ...}
/// ```
///
/// 201 with [`SignedIn`]; 422 for form errors, 409 when the email is taken.
pub async fn register<B: Backend>(
    State(state): State<AppState<B>>,
    CorrelationId(correlation_id): CorrelationId,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<SignedIn>), AppError> {
    let portal = state.start_portal();

    match portal.register(form).await {
        Ok(member) => {
            let access = portal.snapshot().access;
            let token = state.sessions.open(portal).await;
            tracing::info!(%correlation_id, member_id = %member.id, "member registered");
            Ok((
                StatusCode::CREATED,
                Json(SignedIn {
                    token: token.to_string(),
                    member_id: member.id,
                    access,
                    redirect: crate::routes::app_path(View::Dashboard),
                }),
            ))
        },
        Err(error) => {
            state.discard(&portal).await;
            Err(error.into())
        },
    }
}

/// Sign in with email and password.
///
/// ```text
/// POST /api/auth/login
/// {"email": "...", "password": "..."}
/// ```
///
/// 200 with [`SignedIn`]; 401 for bad credentials.
pub async fn login<B: Backend>(
    State(state): State<AppState<B>>,
    CorrelationId(correlation_id): CorrelationId,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SignedIn>, AppError> {
    let portal = state.start_portal();

    match portal.login(credentials).await {
        Ok(snapshot) => {
            let member_id = snapshot
                .member_id()
                .cloned()
                .ok_or_else(|| AppError::internal("Signed in without an identity"))?;
            let token = state.sessions.open(portal).await;
            tracing::info!(%correlation_id, %member_id, access = ?snapshot.access, "member signed in");
            Ok(Json(SignedIn {
                token: token.to_string(),
                member_id,
                access: snapshot.access,
                redirect: crate::routes::app_path(View::Dashboard),
            }))
        },
        Err(error) => {
            state.discard(&portal).await;
            Err(error.into())
        },
    }
}

/// Sign out and close the client.
///
/// ```text
/// POST /api/auth/logout
/// Authorization: Bearer <token>
/// ```
///
/// 204 on success. A gateway failure keeps the client open.
pub async fn logout<B: Backend>(
    State(state): State<AppState<B>>,
    session: ClientSession<B>,
) -> Result<StatusCode, AppError> {
    session.portal.logout().await?;

    if let Some(portal) = state.sessions.close(&session.token).await {
        state.discard(&portal).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Send a password reset email.
///
/// ```text
/// POST /api/auth/password-reset
/// {"email": "..."}
/// ```
///
/// 202 with a [`Notice`].
pub async fn password_reset<B: Backend>(
    State(state): State<AppState<B>>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    let portal = state.start_portal();
    let result = portal.request_password_reset(request.email).await;
    let notice = portal.account().state(|account| account.notice.clone()).await;
    state.discard(&portal).await;
    result?;

    Ok((
        StatusCode::ACCEPTED,
        Json(Notice {
            notice: notice.unwrap_or_else(|| "Password reset email sent".to_string()),
        }),
    ))
}
