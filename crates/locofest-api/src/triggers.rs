//! Work that runs after a document is created: message window trims and the
//! report threshold check. Both are safe to fire more than once.

use anyhow::Result;
use locofest_db::Database;
use locofest_policy::ModerationPolicy;
use locofest_policy::chat_window;
use locofest_types::models::ChannelKind;
use tracing::{debug, info};

/// Trims a channel down to its newest `window` messages. Returns how many
/// messages were deleted.
pub fn on_message_created(
    db: &Database,
    kind: ChannelKind,
    channel_id: &str,
    window: usize,
) -> Result<usize> {
    let ids = db.message_ids_newest_first(kind, channel_id)?;
    let doomed = chat_window::trim(&ids, window);
    if doomed.is_empty() {
        return Ok(0);
    }

    let removed = db.delete_messages(kind, doomed)?;
    info!("Trimmed {} messages from {} {}", removed, kind, channel_id);
    Ok(removed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The report did not name an event.
    NoTarget,
    BelowThreshold { reports: usize },
    TakenDown {
        reports_deleted: usize,
        analytics_deleted: usize,
    },
}

/// Counts the reports against `event_id` and, once the threshold is reached,
/// deletes the event with every report counted in that same snapshot.
pub fn on_report_created(
    db: &Database,
    policy: &ModerationPolicy,
    event_id: Option<&str>,
) -> Result<ReportOutcome> {
    let Some(event_id) = event_id.filter(|id| !id.is_empty()) else {
        return Ok(ReportOutcome::NoTarget);
    };

    let report_ids = db.report_ids_for_event(event_id)?;
    if !policy.evaluate(report_ids.len()).delete_target {
        debug!("Event {} has {} reports", event_id, report_ids.len());
        return Ok(ReportOutcome::BelowThreshold { reports: report_ids.len() });
    }

    let (summary, reports_deleted) = db.delete_event_and_reports(event_id, &report_ids)?;
    info!(
        "Event {} removed after {} reports ({} analytics entries)",
        event_id, reports_deleted, summary.analytics_deleted
    );
    Ok(ReportOutcome::TakenDown {
        reports_deleted,
        analytics_deleted: summary.analytics_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use locofest_types::models::{ChatMessage, Event, Report};

    fn fill_channel(db: &Database, kind: ChannelKind, channel: &str, count: usize) {
        let base = Utc::now() - Duration::days(1);
        for i in 0..count {
            db.insert_message(
                kind,
                &ChatMessage {
                    id: format!("{channel}-{i:03}"),
                    channel_id: channel.into(),
                    author_id: "author".into(),
                    text: format!("message {i}"),
                    sent_at: base + Duration::seconds(i as i64),
                },
            )
            .unwrap();
        }
    }

    fn file_reports(db: &Database, event_id: &str, count: usize) {
        for i in 0..count {
            db.insert_report(&Report {
                id: format!("r-{event_id}-{i}"),
                event_id: Some(event_id.into()),
                reporter_id: format!("reporter-{i}"),
                created_at: Utc::now(),
            })
            .unwrap();
        }
    }

    #[test]
    fn trims_to_newest_hundred() {
        let db = Database::open_in_memory().unwrap();
        fill_channel(&db, ChannelKind::CityChat, "paris", 105);

        let removed = on_message_created(&db, ChannelKind::CityChat, "paris", 100).unwrap();
        assert_eq!(removed, 5);

        let ids = db.message_ids_newest_first(ChannelKind::CityChat, "paris").unwrap();
        assert_eq!(ids.len(), 100);
        assert_eq!(ids.first().map(String::as_str), Some("paris-104"));
        assert_eq!(ids.last().map(String::as_str), Some("paris-005"));

        // Replayed trigger finds nothing left to do.
        assert_eq!(on_message_created(&db, ChannelKind::CityChat, "paris", 100).unwrap(), 0);
    }

    #[test]
    fn canal_trim_is_scoped_to_its_calendar() {
        let db = Database::open_in_memory().unwrap();
        fill_channel(&db, ChannelKind::Canal, "cal-a", 3);
        fill_channel(&db, ChannelKind::Canal, "cal-b", 3);

        assert_eq!(on_message_created(&db, ChannelKind::Canal, "cal-a", 2).unwrap(), 1);
        assert_eq!(db.message_ids_newest_first(ChannelKind::Canal, "cal-a").unwrap(), ["cal-a-002", "cal-a-001"]);
        assert_eq!(db.message_ids_newest_first(ChannelKind::Canal, "cal-b").unwrap().len(), 3);
    }

    #[test]
    fn report_without_target_is_ignored() {
        let db = Database::open_in_memory().unwrap();
        let policy = ModerationPolicy::default();
        assert_eq!(on_report_created(&db, &policy, None).unwrap(), ReportOutcome::NoTarget);
        assert_eq!(on_report_created(&db, &policy, Some("")).unwrap(), ReportOutcome::NoTarget);
    }

    #[test]
    fn threshold_takes_down_event_and_reports() {
        let db = Database::open_in_memory().unwrap();
        let policy = ModerationPolicy::default();
        db.insert_event(&Event {
            id: "e1".into(),
            calendar_id: None,
            creator_id: Some("c".into()),
            created_at: Some(Utc::now()),
        })
        .unwrap();
        db.insert_analytics("views", "v1", "e1", None, None).unwrap();

        file_reports(&db, "e1", 149);
        assert_eq!(
            on_report_created(&db, &policy, Some("e1")).unwrap(),
            ReportOutcome::BelowThreshold { reports: 149 }
        );
        assert!(db.event_exists("e1", None).unwrap());

        db.insert_report(&Report {
            id: "r-last".into(),
            event_id: Some("e1".into()),
            reporter_id: "someone".into(),
            created_at: Utc::now(),
        })
        .unwrap();

        assert_eq!(
            on_report_created(&db, &policy, Some("e1")).unwrap(),
            ReportOutcome::TakenDown { reports_deleted: 150, analytics_deleted: 1 }
        );
        assert!(!db.event_exists("e1", None).unwrap());
        assert!(db.report_ids_for_event("e1").unwrap().is_empty());
    }

    #[test]
    fn reports_on_a_missing_event_are_still_swept() {
        let db = Database::open_in_memory().unwrap();
        let policy = ModerationPolicy { threshold: 3 };
        file_reports(&db, "ghost", 3);

        let outcome = on_report_created(&db, &policy, Some("ghost")).unwrap();
        assert_eq!(outcome, ReportOutcome::TakenDown { reports_deleted: 3, analytics_deleted: 0 });
        assert!(db.report_ids_for_event("ghost").unwrap().is_empty());
    }
}
