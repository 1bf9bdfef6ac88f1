//! Request context middleware.
//!
//! Every request runs inside an `http_request` span that records the
//! correlation id, the matched route, the portal view being navigated to and
//! a short tag of the bearer session. The correlation id is taken from the
//! `X-Correlation-ID` header when it holds a UUID, otherwise generated. It is
//! echoed in the response header and in the body of every
//! [`AppError`](crate::error::AppError) raised while handling the request.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/app/:view", get(navigation::view::<B>))
//!     .layer(axum::middleware::from_fn(request_context));
//! ```

use crate::extractors::bearer_token;
use crate::routes::APP_PREFIX;
use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use clubhouse_portal::View;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Hex digits of the session token kept in logs.
const SESSION_TAG_LEN: usize = 8;

tokio::task_local! {
    static CORRELATION_ID: Uuid;
}

/// Correlation id of the request being handled on this task.
#[must_use]
pub fn current_correlation_id() -> Option<Uuid> {
    CORRELATION_ID.try_with(|id| *id).ok()
}

/// Wrap the request in its span and correlation scope.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let correlation_id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    req.extensions_mut().insert(correlation_id);

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned());
    let view = navigated_view(req.uri().path());
    let session = bearer_token(req.headers()).map(session_tag);

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %req.method(),
        route = route.as_deref(),
        view = view.map(tracing::field::display),
        session = session.as_deref(),
    );

    let mut response = CORRELATION_ID
        .scope(correlation_id, next.run(req))
        .instrument(span)
        .await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

/// View named by a navigation path such as `/app/dashboard`.
fn navigated_view(path: &str) -> Option<View> {
    path.strip_prefix(APP_PREFIX)?.parse().ok()
}

/// Short, non-replayable tag identifying a session in logs.
fn session_tag(token: Uuid) -> String {
    let mut tag = token.simple().to_string();
    tag.truncate(SESSION_TAG_LEN);
    tag
}
