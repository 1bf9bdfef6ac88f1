//! Domain types for the club portal.
//!
//! Field names serialize in camelCase so member, session and registration
//! documents keep the shape the Profile Store already holds.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a provider-issued identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

opaque_id!(
    /// Member identifier, issued by the Identity Gateway.
    MemberId
);
opaque_id!(
    /// Training session identifier (document id in the `sessions` collection).
    SessionId
);
opaque_id!(
    /// Registration identifier (document id in the `registrations` collection).
    RegistrationId
);

// ═══════════════════════════════════════════════════════════════════════
// Members
// ═══════════════════════════════════════════════════════════════════════

/// Membership tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    /// Pay-per-session player.
    #[default]
    Casual,
    /// Student membership.
    Student,
    /// Full membership.
    Full,
}

impl MembershipTier {
    /// All tiers, in the order the registration form offers them.
    pub const ALL: [Self; 3] = [Self::Casual, Self::Student, Self::Full];

    /// Stored value (`casual`, `student`, `full`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Student => "student",
            Self::Full => "full",
        }
    }

    /// Upper-cased chip label shown on the dashboard.
    #[must_use]
    pub const fn chip_label(self) -> &'static str {
        match self {
            Self::Casual => "CASUAL",
            Self::Student => "STUDENT",
            Self::Full => "FULL",
        }
    }

    /// Label used by the registration form's tier selector.
    #[must_use]
    pub const fn form_label(self) -> &'static str {
        match self {
            Self::Casual => "Casual Player",
            Self::Student => "Student Member",
            Self::Full => "Full Member",
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular club member.
    Member,
    /// Club administrator.
    Admin,
}

/// Emergency contact stored on a member profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Contact name.
    #[serde(default)]
    pub name: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: String,
    /// Relationship to the member.
    #[serde(default)]
    pub relationship: String,
}

impl EmergencyContact {
    /// `true` when every field is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.phone.trim().is_empty()
            && self.relationship.trim().is_empty()
    }

    /// `None` for a blank contact, so empty form sections are not stored.
    #[must_use]
    pub fn non_blank(self) -> Option<Self> {
        if self.is_blank() { None } else { Some(self) }
    }
}

/// Profile fields captured at registration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Requested membership tier.
    #[serde(default)]
    pub membership_type: MembershipTier,
    /// Optional emergency contact.
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
}

impl NewMember {
    /// Display name pushed to the Identity Gateway ("First Last").
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// A registered member's profile document (`users/{uid}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Identifier issued by the Identity Gateway (the document id).
    #[serde(default)]
    pub id: MemberId,
    /// Email address.
    pub email: String,
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Membership tier.
    #[serde(default)]
    pub membership_type: MembershipTier,
    /// Role; documents written outside the portal may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// When the member joined.
    pub join_date: DateTime<Utc>,
    /// Whether the membership is active.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Optional emergency contact.
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
}

const fn default_active() -> bool {
    true
}

impl Member {
    /// Build the profile document written at registration.
    ///
    /// New members always start with the `member` role and an active flag.
    #[must_use]
    pub fn from_registration(
        id: MemberId,
        email: String,
        profile: NewMember,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            first_name: profile.first_name.trim().to_string(),
            last_name: profile.last_name.trim().to_string(),
            phone: profile.phone.trim().to_string(),
            membership_type: profile.membership_type,
            role: Some(Role::Member),
            join_date: joined_at,
            is_active: true,
            emergency_contact: profile.emergency_contact.and_then(EmergencyContact::non_blank),
        }
    }

    /// `true` only for an explicit admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Apply a profile edit.
    pub fn apply(&mut self, changes: ProfileChanges) {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(phone) = changes.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(tier) = changes.membership_type {
            self.membership_type = tier;
        }
        if let Some(contact) = changes.emergency_contact {
            self.emergency_contact = contact.non_blank();
        }
    }
}

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    /// New first name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// New last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// New phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// New membership tier.
    #[serde(default)]
    pub membership_type: Option<MembershipTier>,
    /// Replacement emergency contact; an all-blank contact removes it.
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
}

impl ProfileChanges {
    /// `true` when nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.membership_type.is_none()
            && self.emergency_contact.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════

/// A signed-in identity returned by the Identity Gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Member identifier (the gateway's user id).
    pub uid: MemberId,
    /// Email the identity signed in with.
    pub email: String,
    /// Display name, once set.
    pub display_name: Option<String>,
    /// Bearer token for Profile Store requests.
    pub id_token: String,
    /// Token used by the provider to refresh `id_token`.
    pub refresh_token: String,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Sessions and registrations
// ═══════════════════════════════════════════════════════════════════════

/// Amount of money in pence (GBP).
///
/// Stored documents hold the cost as a number of pounds, e.g. `5` or `5.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    pence: u64,
}

impl Money {
    /// Construct from pence.
    #[must_use]
    pub const fn from_pence(pence: u64) -> Self {
        Self { pence }
    }

    /// Construct from whole pounds.
    #[must_use]
    pub const fn from_pounds(pounds: u64) -> Self {
        Self { pence: pounds * 100 }
    }

    /// Amount in pence.
    #[must_use]
    pub const fn pence(self) -> u64 {
        self.pence
    }

    #[allow(clippy::cast_precision_loss)] // session prices are far below 2^52 pence
    fn as_pounds(self) -> f64 {
        self.pence as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pounds = self.pence / 100;
        let pence = self.pence % 100;
        if pence == 0 {
            write!(f, "£{pounds}")
        } else {
            write!(f, "£{pounds}.{pence:02}")
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.pence % 100 == 0 {
            serializer.serialize_u64(self.pence / 100)
        } else {
            serializer.serialize_f64(self.as_pounds())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pounds = f64::deserialize(deserializer)?;
        if !pounds.is_finite() || pounds < 0.0 {
            return Err(serde::de::Error::custom(format!("invalid cost: {pounds}")));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // checked above
        let pence = (pounds * 100.0).round() as u64;
        Ok(Self { pence })
    }
}

/// A scheduled training session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSession {
    /// Document id.
    #[serde(default)]
    pub id: SessionId,
    /// Title, e.g. "Advanced Training".
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Calendar date.
    #[serde(with = "calendar::date")]
    pub date: NaiveDate,
    /// Start time.
    #[serde(with = "calendar::time")]
    pub start_time: NaiveTime,
    /// End time.
    #[serde(with = "calendar::time")]
    pub end_time: NaiveTime,
    /// Venue name.
    #[serde(default)]
    pub venue: String,
    /// Price per player.
    #[serde(default)]
    pub cost: Money,
    /// Maximum number of players.
    #[serde(default)]
    pub max_participants: u32,
}

/// A registration to be written by the booking workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    /// Session being booked.
    pub session_id: SessionId,
    /// Member booking it.
    pub member_id: MemberId,
    /// When the booking was submitted.
    pub registered_at: DateTime<Utc>,
}

/// A stored registration linking a member to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Document id.
    #[serde(default)]
    pub id: RegistrationId,
    /// Booked session.
    pub session_id: SessionId,
    /// Booking member.
    pub member_id: MemberId,
    /// When the booking was submitted.
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    /// Attach the id assigned by the Profile Store.
    #[must_use]
    pub fn stored(id: RegistrationId, registration: NewRegistration) -> Self {
        Self {
            id,
            session_id: registration.session_id,
            member_id: registration.member_id,
            registered_at: registration.registered_at,
        }
    }
}

/// Serde helpers for calendar fields.
///
/// Session dates arrive either as `YYYY-MM-DD` or as a full RFC 3339
/// timestamp (Firestore `timestampValue`); times as `HH:MM` or `HH:MM:SS`.
pub mod calendar {
    /// `NaiveDate` as `YYYY-MM-DD`.
    pub mod date {
        use chrono::{DateTime, NaiveDate};
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialize as `YYYY-MM-DD`.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&date.format("%Y-%m-%d"))
        }

        /// Deserialize from a date or an RFC 3339 timestamp.
        ///
        /// # Errors
        ///
        /// Fails when the string is neither form.
        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
            let raw = String::deserialize(deserializer)?;
            parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
        }

        /// Parse `YYYY-MM-DD` or an RFC 3339 timestamp (date taken in UTC).
        #[must_use]
        pub fn parse(raw: &str) -> Option<NaiveDate> {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|ts| ts.naive_utc().date())
            })
        }
    }

    /// `NaiveTime` as `HH:MM`.
    pub mod time {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialize as `HH:MM`.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&time.format("%H:%M"))
        }

        /// Deserialize from `HH:MM` or `HH:MM:SS`.
        ///
        /// # Errors
        ///
        /// Fails for any other format.
        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
            let raw = String::deserialize(deserializer)?;
            NaiveTime::parse_from_str(&raw, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
                .map_err(|_| serde::de::Error::custom(format!("invalid time: {raw}")))
        }
    }
}
