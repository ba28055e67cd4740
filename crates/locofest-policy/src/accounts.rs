use chrono::{DateTime, Duration, Utc};
use locofest_types::models::User;

/// Unverified accounts get this long to confirm their email.
pub const UNVERIFIED_GRACE_DAYS: i64 = 7;

pub fn should_purge_unverified(user: &User, now: DateTime<Utc>) -> bool {
    if user.email_verified {
        return false;
    }
    user.created_at
        .is_some_and(|ts| now.signed_duration_since(ts) > Duration::days(UNVERIFIED_GRACE_DAYS))
}
