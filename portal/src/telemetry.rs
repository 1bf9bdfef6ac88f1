//! Metric descriptions for the portal counters.

/// Register descriptions with the installed recorder.
///
/// Call once after installing a recorder; counters work without it, the
/// descriptions only add help text to the exported metrics.
pub fn describe() {
    metrics::describe_counter!(
        "clubhouse_signups_total",
        "Accounts created through the registration form"
    );
    metrics::describe_counter!("clubhouse_logins_total", "Successful sign-ins");
    metrics::describe_counter!(
        "clubhouse_login_failures_total",
        "Rejected sign-ins, including local validation failures"
    );
    metrics::describe_counter!(
        "clubhouse_password_resets_total",
        "Password reset emails requested"
    );
    metrics::describe_counter!(
        "clubhouse_profile_updates_total",
        "Member profile edits written"
    );
    metrics::describe_counter!(
        "clubhouse_registrations_total",
        "Session registrations written, duplicates included"
    );
    metrics::describe_counter!(
        "clubhouse_registration_failures_total",
        "Session registration writes that failed"
    );
}
