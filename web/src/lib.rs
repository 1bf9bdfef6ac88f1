//! HTTP shell for the Clubhouse membership portal.
//!
//! Serves the portal workflows over axum. The server keeps one portal client
//! per signed-in caller, named by an opaque bearer token; the providers'
//! identity tokens stay server-side.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Resolve** the caller's portal client from the bearer token
//! 3. **Send** the action to the client's store and wait for its result
//! 4. **Map** the outcome or [`AppError`] to an HTTP response
//!
//! Navigation requests (`GET /app/{view}`) never reach a store: they are
//! decided from the cached access level and answered with a page view model
//! or a `303 See Other` redirect.
//!
//! # Example
//!
//! ```ignore
//! use clubhouse_web::{build_router, AppState, Config};
//!
//! let config = Config::from_env()?;
//! let backend = FirebaseBackend::new(config.provider.clone())?;
//! let state = AppState::new(backend, Arc::new(SystemClock), config.portal, metrics);
//! let app = build_router(state, config.server.request_timeout);
//! axum::serve(listener, app).await?;
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod state;

pub use config::{Config, ServerConfig};
pub use error::AppError;
pub use extractors::{ClientSession, CorrelationId};
pub use middleware::{current_correlation_id, request_context, CORRELATION_ID_HEADER};
pub use registry::SessionRegistry;
pub use routes::build_router;
pub use state::AppState;
