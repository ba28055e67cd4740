//! Scheduled sweeps. A sweep only fails as a whole when it cannot list what
//! it is supposed to examine; per-entity failures are logged and counted.

use anyhow::Result;
use chrono::{DateTime, Utc};
use locofest_db::Database;
use locofest_policy::accounts::should_purge_unverified;
use locofest_policy::{RetentionPolicy, RoleSnapshot};
use locofest_types::models::Event;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Deletes accounts that never verified their email within the grace period.
pub fn purge_unverified_users(db: &Database, now: DateTime<Utc>) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    for user in db.list_users()? {
        report.examined += 1;
        if !should_purge_unverified(&user, now) {
            continue;
        }
        match db.delete_user(&user.id) {
            Ok(true) => report.deleted += 1,
            Ok(false) => {}
            Err(e) => {
                warn!("Failed to delete unverified user {}: {:#}", user.id, e);
                report.failed += 1;
            }
        }
    }

    info!("Deleted {} unverified users", report.deleted);
    Ok(report)
}

/// Deletes public and private-calendar events past their retention window,
/// judged against the roles their owners hold right now.
pub fn purge_stale_events(
    db: &Database,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<SweepReport> {
    let roles: RoleSnapshot = db.list_roles()?.into_iter().collect();
    let mut report = SweepReport::default();

    for event in db.list_events()? {
        let privileged = roles.is_privileged(event.creator_id.as_deref());
        expire_event(db, policy, now, &event, privileged, &mut report);
    }

    for calendar in db.list_calendars()? {
        let privileged = roles.is_privileged(calendar.owner());
        let events = match db.list_calendar_events(&calendar.id) {
            Ok(events) => events,
            Err(e) => {
                warn!("Failed to list events of calendar {}: {:#}", calendar.id, e);
                report.failed += 1;
                continue;
            }
        };
        for event in events {
            expire_event(db, policy, now, &event, privileged, &mut report);
        }
    }

    info!(
        "Event sweep: examined {}, deleted {}, failed {}",
        report.examined, report.deleted, report.failed
    );
    Ok(report)
}

fn expire_event(
    db: &Database,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
    event: &Event,
    privileged: bool,
    report: &mut SweepReport,
) {
    report.examined += 1;
    if !policy.should_delete(event.created_at, now, privileged) {
        return;
    }

    let calendar_id = event.calendar_id.as_deref();
    match db.delete_event_cascade(&event.id, calendar_id) {
        Ok(_) => {
            report.deleted += 1;
            match calendar_id {
                Some(cal) => info!("Deleted private event {} in {}", event.id, cal),
                None => info!("Deleted public event {}", event.id),
            }
        }
        Err(e) => {
            warn!("Failed to delete event {}: {:#}", event.id, e);
            report.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use locofest_types::models::{Calendar, Role};

    fn user(db: &Database, id: &str, role: Role, verified: bool, age_days: Option<i64>, now: DateTime<Utc>) {
        db.register_user(id, verified, age_days.map(|d| now - Duration::days(d))).unwrap();
        db.set_role(id, role).unwrap();
    }

    fn event(db: &Database, id: &str, calendar: Option<&str>, creator: Option<&str>, age: Option<Duration>, now: DateTime<Utc>) {
        db.insert_event(&Event {
            id: id.into(),
            calendar_id: calendar.map(Into::into),
            creator_id: creator.map(Into::into),
            created_at: age.map(|a| now - a),
        })
        .unwrap();
    }

    #[test]
    fn unverified_sweep_keeps_verified_and_recent_accounts() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        user(&db, "stale", Role::Standard, false, Some(8), now);
        user(&db, "fresh", Role::Standard, false, Some(2), now);
        user(&db, "verified", Role::Standard, true, Some(300), now);
        user(&db, "undated", Role::Standard, false, None, now);

        let report = purge_unverified_users(&db, now).unwrap();
        assert_eq!(report, SweepReport { examined: 4, deleted: 1, failed: 0 });
        assert!(db.get_user("stale").unwrap().is_none());
        assert!(db.get_user("fresh").unwrap().is_some());
        assert!(db.get_user("verified").unwrap().is_some());
        assert!(db.get_user("undated").unwrap().is_some());
    }

    #[test]
    fn public_events_follow_creator_tier() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        user(&db, "boss", Role::Boss, true, Some(100), now);
        user(&db, "prem", Role::Premium, true, Some(100), now);
        user(&db, "std", Role::Standard, true, Some(100), now);

        event(&db, "std-old", None, Some("std"), Some(Duration::days(5)), now);
        event(&db, "std-new", None, Some("std"), Some(Duration::days(3)), now);
        event(&db, "boss-mid", None, Some("boss"), Some(Duration::days(20)), now);
        event(&db, "prem-old", None, Some("prem"), Some(Duration::days(32)), now);
        event(&db, "orphan-old", None, None, Some(Duration::days(5)), now);
        event(&db, "undated", None, Some("std"), None, now);
        db.insert_analytics("event_views", "ev1", "std-old", None, Some("std")).unwrap();

        let report = purge_stale_events(&db, &RetentionPolicy::default(), now).unwrap();
        assert_eq!(report.examined, 6);
        assert_eq!(report.deleted, 3);

        let left: Vec<String> = db.list_events().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(left, ["boss-mid", "std-new", "undated"]);
        let remaining: usize = db.analytics_counts("std-old", None).unwrap().iter().map(|(_, n)| n).sum();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn calendar_events_use_owner_with_user_id_fallback() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        user(&db, "prem", Role::Premium, true, Some(100), now);

        for (id, owner, user_id) in [
            ("cal-owner", Some("prem"), None),
            ("cal-legacy", None, Some("prem")),
            ("cal-blank-owner", Some(""), Some("prem")),
            ("cal-nobody", None, None),
        ] {
            db.insert_calendar(&Calendar {
                id: id.into(),
                owner_id: owner.map(Into::into),
                user_id: user_id.map(Into::into),
            })
            .unwrap();
            event(&db, "e", Some(id), None, Some(Duration::days(10)), now);
        }

        let report = purge_stale_events(&db, &RetentionPolicy::default(), now).unwrap();
        assert_eq!(report.deleted, 1);
        assert!(db.event_exists("e", Some("cal-owner")).unwrap());
        assert!(db.event_exists("e", Some("cal-legacy")).unwrap());
        assert!(db.event_exists("e", Some("cal-blank-owner")).unwrap());
        assert!(!db.event_exists("e", Some("cal-nobody")).unwrap());
    }

    #[test]
    fn role_changes_apply_at_sweep_time() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        user(&db, "u", Role::Premium, true, Some(100), now);
        event(&db, "e", None, Some("u"), Some(Duration::days(10)), now);

        purge_stale_events(&db, &RetentionPolicy::default(), now).unwrap();
        assert!(db.event_exists("e", None).unwrap());

        // Downgraded since the event was created.
        db.set_role("u", Role::Standard).unwrap();
        purge_stale_events(&db, &RetentionPolicy::default(), now).unwrap();
        assert!(!db.event_exists("e", None).unwrap());
    }
}
