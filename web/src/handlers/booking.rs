//! Session booking endpoints.

use crate::error::AppError;
use crate::extractors::ClientSession;
use axum::{extract::Path, http::StatusCode, Json};
use clubhouse_portal::booking::BannerKind;
use clubhouse_portal::views::SessionsView;
use clubhouse_portal::{Backend, SessionId};

/// Register the caller for a session.
///
/// ```text
/// POST /api/sessions/{id}/registrations
/// Authorization: Bearer <token>
/// ```
///
/// Answers with the sessions page either way: 201 when the registration was
/// stored, 503 when the write failed (error banner, dialog still open).
/// Loads the session list first if the session is not in it yet.
pub async fn register_for_session<B: Backend>(
    session: ClientSession<B>,
    Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<SessionsView>), AppError> {
    let portal = &session.portal;
    let session_id = SessionId::new(session_id);

    let listed = portal
        .booking()
        .state(|state| state.session(&session_id).is_some())
        .await;
    if !listed {
        portal.load_sessions().await?;
    }

    let page = portal.book_session(session_id).await?;
    let status = match page.banner.as_ref().map(|banner| banner.kind) {
        Some(BannerKind::Error) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::CREATED,
    };
    Ok((status, Json(page)))
}

/// Close the confirmation dialog.
///
/// ```text
/// DELETE /api/dialog
/// ```
pub async fn close_dialog<B: Backend>(
    session: ClientSession<B>,
) -> Result<Json<SessionsView>, AppError> {
    Ok(Json(session.portal.close_dialog().await?))
}

/// Clear the sessions page banner.
///
/// ```text
/// DELETE /api/banner
/// ```
pub async fn dismiss_banner<B: Backend>(
    session: ClientSession<B>,
) -> Result<Json<SessionsView>, AppError> {
    Ok(Json(session.portal.dismiss_banner().await?))
}
