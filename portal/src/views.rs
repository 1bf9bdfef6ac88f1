//! View models for the portal pages.
//!
//! Each view is plain data built from workflow state; rendering (HTML, JSON,
//! terminal) is left to the caller.

use crate::booking::{Banner, BookingState};
use crate::format::{clock_time, long_date, member_since, time_range};
use crate::navigation::{nav_links, Access, NavLink};
use crate::types::{
    EmergencyContact, Member, MemberId, MembershipTier, Registration, Role, SessionId,
    TrainingSession,
};
use serde::Serialize;
use std::collections::HashMap;

/// Club name used in page titles.
pub const CLUB_NAME: &str = "Spelthorne VC";

/// How many upcoming sessions the dashboard lists.
pub const DASHBOARD_PREVIEW: usize = 5;

// ═══════════════════════════════════════════════════════════════════════
// Navbar
// ═══════════════════════════════════════════════════════════════════════

/// Top navigation bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavBar {
    /// Brand text.
    pub brand: String,
    /// Page links; the admin link only appears for admins.
    pub links: Vec<NavLink>,
    /// Avatar letter: first name initial, else email initial.
    pub avatar: Option<char>,
    /// Account menu entries.
    pub menu: Vec<&'static str>,
}

impl NavBar {
    /// Build the navbar for the current identity.
    #[must_use]
    pub fn build(access: Access, email: Option<&str>, profile: Option<&Member>) -> Self {
        let avatar = profile
            .and_then(|member| member.first_name.chars().next())
            .or_else(|| email.and_then(|email| email.chars().next()));
        let menu = if access.is_authenticated() {
            vec!["Profile", "Logout"]
        } else {
            Vec::new()
        };
        Self {
            brand: format!("{CLUB_NAME} Portal"),
            links: nav_links(access),
            avatar: avatar.filter(|_| access.is_authenticated()),
            menu,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Dashboard
// ═══════════════════════════════════════════════════════════════════════

/// One line in the dashboard's upcoming list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session id.
    pub id: SessionId,
    /// Title.
    pub title: String,
    /// `Saturday 4 January 2025 at 19:00`
    pub when: String,
    /// `Sunbury Leisure Centre • £5`
    pub details: String,
}

impl SessionSummary {
    fn of(session: &TrainingSession) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            when: format!(
                "{} at {}",
                long_date(session.date),
                clock_time(session.start_time)
            ),
            details: format!("{} • {}", session.venue, session.cost),
        }
    }
}

/// Member dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// `Welcome back, Sam!`
    pub greeting: String,
    /// Upper-cased tier, empty without a profile.
    pub membership_chip: String,
    /// Number of upcoming sessions.
    pub session_count: usize,
    /// Join year or `N/A`.
    pub member_since: String,
    /// First few upcoming sessions.
    pub upcoming: Vec<SessionSummary>,
    /// Shown when there is nothing upcoming.
    pub empty_message: Option<&'static str>,
}

impl DashboardView {
    /// Build from the member profile and the upcoming sessions, in order.
    #[must_use]
    pub fn build(profile: Option<&Member>, upcoming: &[TrainingSession]) -> Self {
        let greeting = match profile.map(|member| member.first_name.trim()) {
            Some(name) if !name.is_empty() => format!("Welcome back, {name}!"),
            _ => "Welcome back!".to_string(),
        };
        Self {
            greeting,
            membership_chip: profile
                .map(|member| member.membership_type.chip_label().to_string())
                .unwrap_or_default(),
            session_count: upcoming.len(),
            member_since: member_since(profile.map(|member| member.join_date)),
            upcoming: upcoming
                .iter()
                .take(DASHBOARD_PREVIEW)
                .map(SessionSummary::of)
                .collect(),
            empty_message: upcoming
                .is_empty()
                .then_some("No upcoming sessions available"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════════════════

/// A session card on the sessions page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCard {
    /// Session id.
    pub id: SessionId,
    /// Title.
    pub title: String,
    /// Long date.
    pub date: String,
    /// Venue.
    pub venue: String,
    /// `Max 12 players`
    pub capacity: String,
    /// `£5`
    pub cost: String,
    /// Description.
    pub description: String,
    /// `19:00 - 21:00`
    pub time: String,
}

impl SessionCard {
    fn of(session: &TrainingSession) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            date: long_date(session.date),
            venue: session.venue.clone(),
            capacity: format!("Max {} players", session.max_participants),
            cost: session.cost.to_string(),
            description: session.description.clone(),
            time: time_range(session.start_time, session.end_time),
        }
    }
}

/// The registration confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDialog {
    /// `Register for Beginners`
    pub heading: String,
    /// Session details.
    pub session: SessionCard,
    /// Confirm button enabled (no registration in flight).
    pub confirm_enabled: bool,
}

/// Sessions page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsView {
    /// Page heading.
    pub heading: &'static str,
    /// Spinner instead of cards.
    pub loading: bool,
    /// Result banner.
    pub banner: Option<Banner>,
    /// Session cards.
    pub cards: Vec<SessionCard>,
    /// Open dialog, if any.
    pub dialog: Option<RegistrationDialog>,
}

impl SessionsView {
    /// Build from booking state.
    #[must_use]
    pub fn build(state: &BookingState) -> Self {
        let dialog = state
            .selected
            .as_ref()
            .filter(|_| state.dialog_open)
            .map(|session| RegistrationDialog {
                heading: format!("Register for {}", session.title),
                session: SessionCard::of(session),
                confirm_enabled: !state.registering,
            });
        Self {
            heading: "Training Sessions",
            loading: state.loading,
            banner: state.banner.clone(),
            cards: state.sessions.iter().map(SessionCard::of).collect(),
            dialog,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Profile
// ═══════════════════════════════════════════════════════════════════════

/// The signed-in member's profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    /// Member id.
    pub id: MemberId,
    /// `First Last`
    pub name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: String,
    /// Membership tier.
    pub membership_type: MembershipTier,
    /// Tier label, e.g. `Student Member`.
    pub membership_label: &'static str,
    /// `admin` or `member`.
    pub role: &'static str,
    /// Join year.
    pub member_since: String,
    /// Membership active.
    pub active: bool,
    /// Emergency contact.
    pub emergency_contact: Option<EmergencyContact>,
}

impl ProfileView {
    /// Build from a member profile.
    #[must_use]
    pub fn build(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.full_name(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            membership_type: member.membership_type,
            membership_label: member.membership_type.form_label(),
            role: role_label(member.role),
            member_since: member_since(Some(member.join_date)),
            active: member.is_active,
            emergency_contact: member.emergency_contact.clone(),
        }
    }
}

const fn role_label(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Admin) => "admin",
        Some(Role::Member) | None => "member",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Admin
// ═══════════════════════════════════════════════════════════════════════

/// A member row in the admin roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    /// Member id.
    pub id: MemberId,
    /// `First Last`
    pub name: String,
    /// Email.
    pub email: String,
    /// Upper-cased tier.
    pub membership: &'static str,
    /// `admin` or `member`.
    pub role: &'static str,
    /// Membership active.
    pub active: bool,
}

/// Registration count for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLoad {
    /// Session id.
    pub id: SessionId,
    /// Title.
    pub title: String,
    /// Long date.
    pub date: String,
    /// Registrations written for the session, duplicates included.
    pub registered: usize,
    /// Maximum participants.
    pub capacity: u32,
    /// More registrations than places. Informational; nothing enforces it.
    pub over_capacity: bool,
}

/// Admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    /// Roster, by last then first name.
    pub members: Vec<MemberRow>,
    /// Sessions with registration counts, in the order given.
    pub sessions: Vec<SessionLoad>,
}

impl AdminView {
    /// Build from the full member list, sessions and registrations.
    #[must_use]
    pub fn build(
        members: &[Member],
        sessions: &[TrainingSession],
        registrations: &[Registration],
    ) -> Self {
        let mut counts: HashMap<&SessionId, usize> = HashMap::new();
        for registration in registrations {
            *counts.entry(&registration.session_id).or_default() += 1;
        }

        let mut roster: Vec<&Member> = members.iter().collect();
        roster.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str(), &a.id)
                .cmp(&(b.last_name.as_str(), b.first_name.as_str(), &b.id))
        });

        Self {
            members: roster
                .into_iter()
                .map(|member| MemberRow {
                    id: member.id.clone(),
                    name: member.full_name(),
                    email: member.email.clone(),
                    membership: member.membership_type.chip_label(),
                    role: role_label(member.role),
                    active: member.is_active,
                })
                .collect(),
            sessions: sessions
                .iter()
                .map(|session| {
                    let registered = counts.get(&session.id).copied().unwrap_or_default();
                    SessionLoad {
                        id: session.id.clone(),
                        title: session.title.clone(),
                        date: long_date(session.date),
                        registered,
                        capacity: session.max_participants,
                        over_capacity: registered > session.max_participants as usize,
                    }
                })
                .collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Guest pages
// ═══════════════════════════════════════════════════════════════════════

/// Login page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    /// Page title.
    pub title: String,
    /// Inline error.
    pub error: Option<String>,
    /// Notice, e.g. after a password reset.
    pub notice: Option<String>,
    /// Submit disabled while a request is in flight.
    pub submitting: bool,
}

/// Registration page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterView {
    /// Page title.
    pub title: String,
    /// Tier choices as `(value, label)`.
    pub membership_options: Vec<(MembershipTier, &'static str)>,
    /// Inline error.
    pub error: Option<String>,
    /// Submit disabled while a request is in flight.
    pub submitting: bool,
}

impl LoginView {
    /// Build from account form state.
    #[must_use]
    pub fn build(state: &crate::account::AccountState) -> Self {
        Self {
            title: format!("{CLUB_NAME} Portal"),
            error: state.error.clone(),
            notice: state.notice.clone(),
            submitting: state.in_flight,
        }
    }
}

impl RegisterView {
    /// Build from account form state.
    #[must_use]
    pub fn build(state: &crate::account::AccountState) -> Self {
        Self {
            title: format!("Join {CLUB_NAME}"),
            membership_options: MembershipTier::ALL
                .iter()
                .map(|tier| (*tier, tier.form_label()))
                .collect(),
            error: state.error.clone(),
            submitting: state.in_flight,
        }
    }
}
