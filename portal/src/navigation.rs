//! Role-gated view routing.
//!
//! Every navigation is decided from the cached [`Access`] level alone; the
//! router never calls a provider. An unmet requirement is a redirect to a
//! fixed fallback view, not an error.

use crate::types::Member;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level of the current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// No identity.
    #[default]
    Unauthenticated,
    /// Signed in without the admin role.
    Member,
    /// Signed in with the admin role.
    Admin,
}

impl Access {
    /// Derive the access level from an identity's presence and its profile.
    ///
    /// A signed-in identity whose profile is missing, or whose profile has no
    /// role, is a plain member.
    #[must_use]
    pub fn resolve(signed_in: bool, profile: Option<&Member>) -> Self {
        match (signed_in, profile) {
            (false, _) => Self::Unauthenticated,
            (true, Some(member)) if member.is_admin() => Self::Admin,
            (true, _) => Self::Member,
        }
    }

    /// `true` for any signed-in identity.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

/// A destination in the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// `/`
    Root,
    /// `/login`
    Login,
    /// `/register`
    Register,
    /// `/dashboard`
    Dashboard,
    /// `/sessions`
    Sessions,
    /// `/profile`
    Profile,
    /// `/admin`
    Admin,
}

/// What a view demands of the current access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone.
    None,
    /// Only signed-out visitors.
    Guest,
    /// Any signed-in identity.
    Authenticated,
    /// Signed in with the admin role.
    Admin,
}

impl View {
    /// Every view, in navbar order.
    pub const ALL: [Self; 7] = [
        Self::Root,
        Self::Login,
        Self::Register,
        Self::Dashboard,
        Self::Sessions,
        Self::Profile,
        Self::Admin,
    ];

    /// URL path of the view.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::Sessions => "/sessions",
            Self::Profile => "/profile",
            Self::Admin => "/admin",
        }
    }

    /// Access the view requires.
    #[must_use]
    pub const fn requirement(self) -> Requirement {
        match self {
            Self::Root => Requirement::None,
            Self::Login | Self::Register => Requirement::Guest,
            Self::Dashboard | Self::Sessions | Self::Profile => Requirement::Authenticated,
            Self::Admin => Requirement::Admin,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Unknown view name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view: {0}")]
pub struct UnknownView(pub String);

impl FromStr for View {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_matches('/') {
            "" => Ok(Self::Root),
            "login" => Ok(Self::Login),
            "register" => Ok(Self::Register),
            "dashboard" => Ok(Self::Dashboard),
            "sessions" => Ok(Self::Sessions),
            "profile" => Ok(Self::Profile),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownView(other.to_string())),
        }
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "view", rename_all = "snake_case")]
pub enum Navigation {
    /// Show the requested view.
    Render(View),
    /// Go to this view instead.
    Redirect(View),
}

impl Navigation {
    /// The view that ends up on screen.
    #[must_use]
    pub const fn view(self) -> View {
        match self {
            Self::Render(view) | Self::Redirect(view) => view,
        }
    }
}

/// Decide where a navigation to `view` lands for `access`.
#[must_use]
pub const fn navigate(view: View, access: Access) -> Navigation {
    match (view.requirement(), access) {
        (Requirement::None, Access::Unauthenticated) => Navigation::Redirect(View::Login),
        (Requirement::None, _) => Navigation::Redirect(View::Dashboard),
        (Requirement::Guest, Access::Unauthenticated)
        | (Requirement::Authenticated, Access::Member | Access::Admin)
        | (Requirement::Admin, Access::Admin) => Navigation::Render(view),
        (Requirement::Guest, _) | (Requirement::Admin, Access::Member) => {
            Navigation::Redirect(View::Dashboard)
        },
        (Requirement::Authenticated | Requirement::Admin, Access::Unauthenticated) => {
            Navigation::Redirect(View::Login)
        },
    }
}

/// A navbar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    /// Link text.
    pub label: &'static str,
    /// Target view.
    pub view: View,
}

/// Navbar links for an access level; empty when signed out.
#[must_use]
pub fn nav_links(access: Access) -> Vec<NavLink> {
    let mut links = match access {
        Access::Unauthenticated => return Vec::new(),
        Access::Member | Access::Admin => vec![
            NavLink { label: "Dashboard", view: View::Dashboard },
            NavLink { label: "Sessions", view: View::Sessions },
        ],
    };
    if access == Access::Admin {
        links.push(NavLink { label: "Admin", view: View::Admin });
    }
    links
}
