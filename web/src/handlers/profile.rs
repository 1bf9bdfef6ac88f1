//! Profile editing.

use crate::error::AppError;
use crate::extractors::ClientSession;
use axum::Json;
use clubhouse_portal::views::ProfileView;
use clubhouse_portal::{Backend, ProfileChanges};

/// Apply profile changes for the caller.
///
/// ```text
/// PUT /api/profile
/// {"firstName": "Sam", "membershipType": "student"}
/// ```
///
/// 200 with the updated profile page; 422 for blank names, 404 when the
/// profile document is missing.
pub async fn update_profile<B: Backend>(
    session: ClientSession<B>,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<ProfileView>, AppError> {
    let member = session.portal.update_profile(changes).await?;
    tracing::info!(member_id = %member.id, "profile updated");
    Ok(Json(ProfileView::build(&member)))
}
