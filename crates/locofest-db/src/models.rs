//! Database row types. These map directly to SQLite rows and keep
//! timestamps as unix milliseconds; conversion to `locofest-types` models
//! happens here so the rest of the workspace never sees raw millis.

use chrono::{DateTime, Utc};
use locofest_types::models::{BlockRecord, Calendar, ChatMessage, Event, Role, User};
use tracing::warn;

pub struct UserRow {
    pub id: String,
    pub email_verified: bool,
    pub role: Option<String>,
    pub created_at: Option<i64>,
}

pub struct EventRow {
    pub id: String,
    pub calendar_id: Option<String>,
    pub creator_id: Option<String>,
    pub created_at: Option<i64>,
}

pub struct CalendarRow {
    pub id: String,
    pub owner_id: Option<String>,
    pub user_id: Option<String>,
}

pub struct MessageRow {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub text: String,
    pub sent_at: i64,
}

pub struct BlockRow {
    pub user_id: String,
    pub channel_id: String,
    pub blocked_until: i64,
}

pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    let ts = DateTime::from_timestamp_millis(ms);
    if ts.is_none() {
        warn!("Timestamp out of range: {}", ms);
    }
    ts
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            role: Role::from_stored(row.role.as_deref()),
            created_at: row.created_at.and_then(from_millis),
            id: row.id,
            email_verified: row.email_verified,
        }
    }
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            calendar_id: row.calendar_id,
            creator_id: row.creator_id,
            created_at: row.created_at.and_then(from_millis),
        }
    }
}

impl From<CalendarRow> for Calendar {
    fn from(row: CalendarRow) -> Self {
        Calendar {
            id: row.id,
            owner_id: row.owner_id,
            user_id: row.user_id,
        }
    }
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            sent_at: from_millis(row.sent_at).unwrap_or_default(),
            id: row.id,
            channel_id: row.channel_id,
            author_id: row.author_id,
            text: row.text,
        }
    }
}

impl From<BlockRow> for BlockRecord {
    fn from(row: BlockRow) -> Self {
        BlockRecord {
            blocked_until: from_millis(row.blocked_until).unwrap_or_default(),
            user_id: row.user_id,
            channel_id: row.channel_id,
        }
    }
}
