use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use locofest_types::models::Role;

pub const BASE_RETENTION_DAYS: i64 = 4;
pub const PRIVILEGED_RETENTION_DAYS: i64 = 31;

/// How long events survive after creation, by owner tier.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub base: Duration,
    pub privileged: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            base: Duration::days(BASE_RETENTION_DAYS),
            privileged: Duration::days(PRIVILEGED_RETENTION_DAYS),
        }
    }
}

impl RetentionPolicy {
    pub fn delay(&self, privileged: bool) -> Duration {
        if privileged { self.privileged } else { self.base }
    }

    /// True once the entity is strictly older than its delay. The boundary
    /// instant itself is kept, and an entity without a creation timestamp is
    /// never eligible.
    pub fn should_delete(
        &self,
        created_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        privileged: bool,
    ) -> bool {
        match created_at {
            Some(ts) => now.signed_duration_since(ts) > self.delay(privileged),
            None => false,
        }
    }
}

/// Roles of every known user, fetched fresh at the start of a sweep.
#[derive(Debug, Clone, Default)]
pub struct RoleSnapshot {
    roles: HashMap<String, Role>,
}

impl RoleSnapshot {
    pub fn role_of(&self, user_id: &str) -> Role {
        self.roles.get(user_id).copied().unwrap_or_default()
    }

    /// Unknown and absent owners are unprivileged.
    pub fn is_privileged(&self, owner_id: Option<&str>) -> bool {
        owner_id.is_some_and(|id| self.role_of(id).is_privileged())
    }
}

impl<S: Into<String>> FromIterator<(S, Role)> for RoleSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, Role)>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().map(|(id, role)| (id.into(), role)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn base_delay_is_strict() {
        let policy = RetentionPolicy::default();
        let at_boundary = now() - Duration::days(4);
        assert!(!policy.should_delete(Some(at_boundary), now(), false));
        assert!(policy.should_delete(Some(at_boundary - Duration::milliseconds(1)), now(), false));
        assert!(!policy.should_delete(Some(at_boundary + Duration::hours(1)), now(), false));
    }

    #[test]
    fn privileged_delay_is_strict() {
        let policy = RetentionPolicy::default();
        let at_boundary = now() - Duration::days(31);
        assert!(!policy.should_delete(Some(at_boundary), now(), true));
        assert!(policy.should_delete(Some(at_boundary - Duration::seconds(1)), now(), true));
        // Ten days old: gone for standard owners, kept for privileged ones.
        let ten_days = now() - Duration::days(10);
        assert!(policy.should_delete(Some(ten_days), now(), false));
        assert!(!policy.should_delete(Some(ten_days), now(), true));
    }

    #[test]
    fn missing_timestamp_is_never_eligible() {
        let policy = RetentionPolicy::default();
        assert!(!policy.should_delete(None, now(), false));
        assert!(!policy.should_delete(None, now() + Duration::days(10_000), true));
    }

    #[test]
    fn future_timestamps_are_kept() {
        let policy = RetentionPolicy::default();
        assert!(!policy.should_delete(Some(now() + Duration::days(40)), now(), false));
    }

    #[test]
    fn snapshot_privilege_lookup() {
        let roles: RoleSnapshot = [
            ("boss-1", Role::Boss),
            ("prem-1", Role::Premium),
            ("std-1", Role::Standard),
        ]
        .into_iter()
        .collect();

        assert!(roles.is_privileged(Some("boss-1")));
        assert!(roles.is_privileged(Some("prem-1")));
        assert!(!roles.is_privileged(Some("std-1")));
        assert!(!roles.is_privileged(Some("ghost")));
        assert!(!roles.is_privileged(None));
        assert_eq!(roles.role_of("ghost"), Role::Standard);
    }
}
