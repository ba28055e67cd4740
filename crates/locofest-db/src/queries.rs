use crate::models::{BlockRow, CalendarRow, EventRow, MessageRow, UserRow, to_millis};
use crate::Database;
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use locofest_types::models::{
    ANALYTICS_COLLECTIONS, BlockRecord, Calendar, ChannelKind, ChatMessage, Event, Report, Role,
    User,
};
use rusqlite::{Connection, params};
use tracing::warn;

/// What a cascade deletion actually removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub event_deleted: bool,
    pub analytics_deleted: usize,
}

impl Database {
    // -- Users --

    /// Creates the profile on first sight. Later calls only refresh the
    /// verification flag; role and creation time are never overwritten.
    pub fn register_user(
        &self,
        id: &str,
        email_verified: bool,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email_verified, role, created_at) VALUES (?1, ?2, NULL, ?3)
                 ON CONFLICT(id) DO UPDATE SET email_verified = excluded.email_verified",
                params![id, email_verified, created_at.map(to_millis)],
            )?;
            Ok(())
        })
    }

    /// Returns false when the user has no profile.
    pub fn set_role(&self, id: &str, role: Role) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("UPDATE users SET role = ?1 WHERE id = ?2", params![role.as_str(), id])?;
            Ok(n > 0)
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, email_verified, role, created_at FROM users WHERE id = ?1",
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row.map(User::from))
        })
    }

    /// `None` when the user has no profile row.
    pub fn get_role(&self, id: &str) -> Result<Option<Role>> {
        Ok(self.get_user(id)?.map(|u| u.role))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, email_verified, role, created_at FROM users ORDER BY id")?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(User::from).collect())
        })
    }

    /// Current role of every user, for building a per-sweep snapshot.
    pub fn list_roles(&self) -> Result<Vec<(String, Role)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, role FROM users")?;
            let rows = stmt
                .query_map([], |row| {
                    let role: Option<String> = row.get(1)?;
                    Ok((row.get::<_, String>(0)?, Role::from_stored(role.as_deref())))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Removes the profile and the user's block records together.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_tx(|tx| {
            tx.execute("DELETE FROM blocked_chats WHERE user_id = ?1", [id])?;
            let n = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Events & calendars --

    /// Inserts a public event, or a calendar event when `calendar_id` is set.
    pub fn insert_event(&self, event: &Event) -> Result<()> {
        self.with_conn(|conn| {
            let created_at = event.created_at.map(to_millis);
            match &event.calendar_id {
                Some(cal) => conn.execute(
                    "INSERT INTO calendar_events (calendar_id, id, creator_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![cal, event.id, event.creator_id, created_at],
                )?,
                None => conn.execute(
                    "INSERT INTO events (id, creator_id, created_at) VALUES (?1, ?2, ?3)",
                    params![event.id, event.creator_id, created_at],
                )?,
            };
            Ok(())
        })
    }

    pub fn list_events(&self) -> Result<Vec<Event>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, NULL, creator_id, created_at FROM events ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], event_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Event::from).collect())
        })
    }

    pub fn list_calendar_events(&self, calendar_id: &str) -> Result<Vec<Event>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, calendar_id, creator_id, created_at FROM calendar_events
                 WHERE calendar_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([calendar_id], event_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Event::from).collect())
        })
    }

    pub fn event_exists(&self, event_id: &str, calendar_id: Option<&str>) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = match calendar_id {
                Some(cal) => conn.query_row(
                    "SELECT COUNT(*) FROM calendar_events WHERE calendar_id = ?1 AND id = ?2",
                    [cal, event_id],
                    |r| r.get(0),
                )?,
                None => conn.query_row(
                    "SELECT COUNT(*) FROM events WHERE id = ?1",
                    [event_id],
                    |r| r.get(0),
                )?,
            };
            Ok(n > 0)
        })
    }

    pub fn insert_calendar(&self, calendar: &Calendar) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO private_calendars (id, owner_id, user_id) VALUES (?1, ?2, ?3)",
                params![calendar.id, calendar.owner_id, calendar.user_id],
            )?;
            Ok(())
        })
    }

    pub fn get_calendar(&self, id: &str) -> Result<Option<Calendar>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, owner_id, user_id FROM private_calendars WHERE id = ?1",
                    [id],
                    calendar_from_row,
                )
                .optional()?;
            Ok(row.map(Calendar::from))
        })
    }

    pub fn list_calendars(&self) -> Result<Vec<Calendar>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, owner_id, user_id FROM private_calendars ORDER BY id")?;
            let rows = stmt
                .query_map([], calendar_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Calendar::from).collect())
        })
    }

    // -- Analytics --

    pub fn insert_analytics(
        &self,
        collection: &str,
        entry_id: &str,
        event_id: &str,
        calendar_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<()> {
        if !ANALYTICS_COLLECTIONS.contains(&collection) {
            bail!("Unknown analytics collection: {}", collection);
        }
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {collection} (id, event_id, calendar_id, user_id, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)"
                ),
                params![entry_id, event_id, calendar_id, user_id, to_millis(Utc::now())],
            )?;
            Ok(())
        })
    }

    /// Entry count per analytics sub-collection. A sub-collection that cannot
    /// be read is left out.
    pub fn analytics_counts(
        &self,
        event_id: &str,
        calendar_id: Option<&str>,
    ) -> Result<Vec<(&'static str, usize)>> {
        self.with_conn(|conn| {
            let mut counts = Vec::with_capacity(ANALYTICS_COLLECTIONS.len());
            for collection in ANALYTICS_COLLECTIONS {
                let n: rusqlite::Result<i64> = conn.query_row(
                    &format!(
                        "SELECT COUNT(*) FROM {collection} WHERE event_id = ?1 AND calendar_id IS ?2"
                    ),
                    params![event_id, calendar_id],
                    |r| r.get(0),
                );
                match n {
                    Ok(n) => counts.push((collection, n as usize)),
                    Err(e) => warn!("Cannot count {} for event {}: {}", collection, event_id, e),
                }
            }
            Ok(counts)
        })
    }

    /// Deletes an event together with its analytics in one transaction.
    pub fn delete_event_cascade(
        &self,
        event_id: &str,
        calendar_id: Option<&str>,
    ) -> Result<CascadeSummary> {
        self.with_tx(|tx| delete_event_cascade_in(tx, event_id, calendar_id))
    }

    // -- Reports --

    pub fn insert_report(&self, report: &Report) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO event_reports (id, event_id, reporter_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    report.id,
                    report.event_id,
                    report.reporter_id,
                    to_millis(report.created_at)
                ],
            )?;
            Ok(())
        })
    }

    pub fn report_ids_for_event(&self, event_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id FROM event_reports WHERE event_id = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map([event_id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Takes down a reported public event and the given reports atomically.
    /// Returns the cascade summary and the number of reports removed.
    pub fn delete_event_and_reports(
        &self,
        event_id: &str,
        report_ids: &[String],
    ) -> Result<(CascadeSummary, usize)> {
        self.with_tx(|tx| {
            let summary = delete_event_cascade_in(tx, event_id, None)?;
            let mut stmt = tx.prepare("DELETE FROM event_reports WHERE id = ?1")?;
            let mut removed = 0;
            for id in report_ids {
                removed += stmt.execute([id])?;
            }
            Ok((summary, removed))
        })
    }

    // -- Messages --

    pub fn insert_message(&self, kind: ChannelKind, message: &ChatMessage) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (id, {}, author_id, text, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
                    kind.table(),
                    kind.parent_column(),
                    kind.order_column()
                ),
                params![
                    message.id,
                    message.channel_id,
                    message.author_id,
                    message.text,
                    to_millis(message.sent_at)
                ],
            )?;
            Ok(())
        })
    }

    /// Message ids of one channel, newest first by the kind's ordering column.
    pub fn message_ids_newest_first(&self, kind: ChannelKind, channel_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id FROM {} WHERE {} = ?1 ORDER BY {} DESC, id DESC",
                kind.table(),
                kind.parent_column(),
                kind.order_column()
            ))?;
            let ids = stmt
                .query_map([channel_id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    pub fn get_messages(&self, kind: ChannelKind, channel_id: &str, limit: u32) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, {parent}, author_id, text, {order} FROM {table}
                 WHERE {parent} = ?1 ORDER BY {order} DESC, id DESC LIMIT ?2",
                table = kind.table(),
                parent = kind.parent_column(),
                order = kind.order_column()
            ))?;
            let rows = stmt
                .query_map(params![channel_id, limit], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        channel_id: row.get(1)?,
                        author_id: row.get(2)?,
                        text: row.get(3)?,
                        sent_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(ChatMessage::from).collect())
        })
    }

    /// Deletes the given messages in one batch. Ids that are already gone are
    /// skipped, so replaying a batch is harmless.
    pub fn delete_messages(&self, kind: ChannelKind, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_tx(|tx| {
            let mut stmt = tx.prepare(&format!("DELETE FROM {} WHERE id = ?1", kind.table()))?;
            let mut removed = 0;
            for id in ids {
                removed += stmt.execute([id])?;
            }
            Ok(removed)
        })
    }

    // -- Blocks --

    /// Last write wins for a given (user, channel).
    pub fn upsert_block(&self, block: &BlockRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO blocked_chats (user_id, channel_id, blocked_until) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, channel_id) DO UPDATE SET blocked_until = excluded.blocked_until",
                params![block.user_id, block.channel_id, to_millis(block.blocked_until)],
            )?;
            Ok(())
        })
    }

    pub fn get_block(&self, user_id: &str, channel_id: &str) -> Result<Option<BlockRecord>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, channel_id, blocked_until FROM blocked_chats
                     WHERE user_id = ?1 AND channel_id = ?2",
                    [user_id, channel_id],
                    |row| {
                        Ok(BlockRow {
                            user_id: row.get(0)?,
                            channel_id: row.get(1)?,
                            blocked_until: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row.map(BlockRecord::from))
        })
    }
}

/// Analytics cleanup is best effort: a sub-collection that cannot be read or
/// cleared is logged and skipped, and the parent is deleted regardless.
fn delete_event_cascade_in(
    conn: &Connection,
    event_id: &str,
    calendar_id: Option<&str>,
) -> Result<CascadeSummary> {
    let mut analytics_deleted = 0;
    for collection in ANALYTICS_COLLECTIONS {
        let sql = format!("DELETE FROM {collection} WHERE event_id = ?1 AND calendar_id IS ?2");
        match conn.execute(&sql, params![event_id, calendar_id]) {
            Ok(n) => analytics_deleted += n,
            Err(e) => warn!("Skipping {} cleanup for event {}: {}", collection, event_id, e),
        }
    }

    let removed = match calendar_id {
        Some(cal) => conn.execute(
            "DELETE FROM calendar_events WHERE calendar_id = ?1 AND id = ?2",
            [cal, event_id],
        )?,
        None => conn.execute("DELETE FROM events WHERE id = ?1", [event_id])?,
    };

    Ok(CascadeSummary {
        event_deleted: removed > 0,
        analytics_deleted,
    })
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email_verified: row.get(1)?,
        role: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn calendar_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CalendarRow> {
    Ok(CalendarRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        user_id: row.get(2)?,
    })
}

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        calendar_id: row.get(1)?,
        creator_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
