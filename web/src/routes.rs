//! Router configuration.

use crate::handlers::{auth, booking, health, navigation, profile};
use crate::middleware::request_context;
use crate::state::AppState;
use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use clubhouse_portal::{Backend, View};
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Prefix under which page navigation is served.
pub const APP_PREFIX: &str = "/app";

/// URL of a view's navigation endpoint, e.g. `/app/dashboard`.
#[must_use]
pub fn app_path(view: View) -> String {
    match view {
        View::Root => APP_PREFIX.to_string(),
        other => format!("{APP_PREFIX}{}", other.path()),
    }
}

/// Build the complete Axum router.
///
/// Requests exceeding `request_timeout` are answered with 408.
pub fn build_router<B: Backend>(state: AppState<B>, request_timeout: Duration) -> Router {
    let api_routes = Router::new()
        // Account
        .route("/auth/register", post(auth::register::<B>))
        .route("/auth/login", post(auth::login::<B>))
        .route("/auth/logout", post(auth::logout::<B>))
        .route("/auth/password-reset", post(auth::password_reset::<B>))
        // Booking
        .route(
            "/sessions/:id/registrations",
            post(booking::register_for_session::<B>),
        )
        .route("/dialog", delete(booking::close_dialog::<B>))
        .route("/banner", delete(booking::dismiss_banner::<B>))
        // Profile
        .route("/profile", put(profile::update_profile::<B>));

    Router::new()
        .route("/health", get(health::health_check::<B>))
        .route("/metrics", get(health::metrics::<B>))
        // Navigation
        .route("/app", get(navigation::root::<B>))
        .route("/app/:view", get(navigation::view::<B>))
        .nest("/api", api_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_context))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_paths() {
        assert_eq!(app_path(View::Root), "/app");
        assert_eq!(app_path(View::Login), "/app/login");
        assert_eq!(app_path(View::Admin), "/app/admin");
    }
}
