//! Sample records for tests.

use crate::types::{
    Identity, Member, MemberId, MembershipTier, Money, Role, SessionId, TrainingSession,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

/// Identity for `uid` with the email `{uid}@club.test`.
#[must_use]
pub fn identity(uid: &str) -> Identity {
    Identity {
        uid: MemberId::new(uid),
        email: format!("{uid}@club.test"),
        display_name: None,
        id_token: format!("token-{uid}"),
        refresh_token: format!("refresh-{uid}"),
    }
}

/// Join date used by [`member`]: 2023-09-05 19:00 UTC.
#[must_use]
pub fn joined() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 9, 5, 19, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Active full member for `uid`.
#[must_use]
pub fn member(uid: &str, role: Option<Role>) -> Member {
    Member {
        id: MemberId::new(uid),
        email: format!("{uid}@club.test"),
        first_name: "Jordan".to_string(),
        last_name: "Price".to_string(),
        phone: "07700 900456".to_string(),
        membership_type: MembershipTier::Full,
        role,
        join_date: joined(),
        is_active: true,
        emergency_contact: None,
    }
}

/// Two-hour £5 session at Sunbury Leisure Centre.
///
/// Falls back to the epoch date or midnight when given an impossible date or hour.
#[must_use]
pub fn session(id: &str, date: (i32, u32, u32), start_hour: u32) -> TrainingSession {
    let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap_or_default();
    let start = NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap_or_default();
    let end = NaiveTime::from_hms_opt((start_hour + 2) % 24, 0, 0).unwrap_or_default();
    TrainingSession {
        id: SessionId::new(id),
        title: format!("Training {id}"),
        description: "Drills followed by match play".to_string(),
        date,
        start_time: start,
        end_time: end,
        venue: "Sunbury Leisure Centre".to_string(),
        cost: Money::from_pounds(5),
        max_participants: 12,
    }
}
