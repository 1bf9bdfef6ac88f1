//! Page navigation.
//!
//! `GET /app/{view}` routes against the caller's cached access level. A met
//! requirement renders the page view model; an unmet one answers
//! `303 See Other` pointing at the fallback view.

use crate::error::AppError;
use crate::extractors::ClientSession;
use crate::routes::app_path;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use clubhouse_portal::account::AccountState;
use clubhouse_portal::views::{
    AdminView, DashboardView, LoginView, NavBar, ProfileView, RegisterView, SessionsView,
};
use clubhouse_portal::{navigate, Access, Backend, Navigation, View};
use serde::Serialize;

/// A rendered page.
#[derive(Debug, Serialize)]
pub struct Page {
    /// Which view this is.
    pub view: View,
    /// Navbar for the caller.
    pub nav: NavBar,
    /// View model.
    pub page: PageBody,
}

/// View model of a page.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PageBody {
    /// `/login`
    Login(LoginView),
    /// `/register`
    Register(RegisterView),
    /// `/dashboard`
    Dashboard(DashboardView),
    /// `/sessions`
    Sessions(SessionsView),
    /// `/profile`
    Profile(ProfileView),
    /// `/admin`
    Admin(AdminView),
}

/// `GET /app`: always redirects, to the dashboard or to login.
pub async fn root<B: Backend>(
    session: Option<ClientSession<B>>,
) -> Result<Response, AppError> {
    show(View::Root, session).await
}

/// `GET /app/{view}`.
pub async fn view<B: Backend>(
    Path(name): Path<String>,
    session: Option<ClientSession<B>>,
) -> Result<Response, AppError> {
    let view: View = name
        .parse()
        .map_err(|_| AppError::not_found("View", &name))?;
    show(view, session).await
}

async fn show<B: Backend>(
    view: View,
    session: Option<ClientSession<B>>,
) -> Result<Response, AppError> {
    let access = session
        .as_ref()
        .map_or(Access::Unauthenticated, |s| s.portal.snapshot().access);

    match navigate(view, access) {
        Navigation::Redirect(target) => {
            tracing::debug!(from = %view, to = %target, ?access, "navigation redirected");
            Ok(Redirect::to(&app_path(target)).into_response())
        },
        Navigation::Render(view) => {
            let page = render(view, session).await?;
            Ok(Json(page).into_response())
        },
    }
}

async fn render<B: Backend>(
    view: View,
    session: Option<ClientSession<B>>,
) -> Result<Page, AppError> {
    let Some(session) = session else {
        // Only guest pages render without a client.
        let guest = AccountState::default();
        let page = match view {
            View::Register => PageBody::Register(RegisterView::build(&guest)),
            _ => PageBody::Login(LoginView::build(&guest)),
        };
        return Ok(Page {
            view,
            nav: NavBar::build(Access::Unauthenticated, None, None),
            page,
        });
    };

    let portal = &session.portal;
    let page = match view {
        View::Login => PageBody::Login(portal.login_view().await),
        View::Register => PageBody::Register(portal.register_view().await),
        View::Root | View::Dashboard => PageBody::Dashboard(portal.dashboard().await),
        View::Sessions => PageBody::Sessions(portal.load_sessions().await?),
        View::Profile => PageBody::Profile(portal.profile_view()?),
        View::Admin => PageBody::Admin(portal.admin_view().await?),
    };

    Ok(Page {
        view,
        nav: portal.nav_bar(),
        page,
    })
}
