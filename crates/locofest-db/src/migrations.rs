use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        // Timestamps are unix milliseconds. A NULL `created_at` means the
        // client never wrote one.
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                email_verified  INTEGER NOT NULL DEFAULT 0,
                role            TEXT,
                created_at      INTEGER
            );

            CREATE TABLE events (
                id          TEXT PRIMARY KEY,
                creator_id  TEXT,
                created_at  INTEGER
            );

            CREATE TABLE private_calendars (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT,
                user_id     TEXT
            );

            CREATE TABLE calendar_events (
                calendar_id TEXT NOT NULL,
                id          TEXT NOT NULL,
                creator_id  TEXT,
                created_at  INTEGER,
                PRIMARY KEY (calendar_id, id)
            );

            CREATE TABLE views (
                id          TEXT NOT NULL,
                event_id    TEXT NOT NULL,
                calendar_id TEXT,
                user_id     TEXT,
                created_at  INTEGER
            );
            CREATE INDEX idx_views_event ON views(event_id, calendar_id);

            CREATE TABLE event_views (
                id          TEXT NOT NULL,
                event_id    TEXT NOT NULL,
                calendar_id TEXT,
                user_id     TEXT,
                created_at  INTEGER
            );
            CREATE INDEX idx_event_views_event ON event_views(event_id, calendar_id);

            CREATE TABLE event_participations (
                id          TEXT NOT NULL,
                event_id    TEXT NOT NULL,
                calendar_id TEXT,
                user_id     TEXT,
                created_at  INTEGER
            );
            CREATE INDEX idx_event_participations_event ON event_participations(event_id, calendar_id);

            CREATE TABLE event_shares (
                id          TEXT NOT NULL,
                event_id    TEXT NOT NULL,
                calendar_id TEXT,
                user_id     TEXT,
                created_at  INTEGER
            );
            CREATE INDEX idx_event_shares_event ON event_shares(event_id, calendar_id);

            CREATE TABLE event_reports (
                id          TEXT PRIMARY KEY,
                event_id    TEXT,
                reporter_id TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );
            CREATE INDEX idx_event_reports_event ON event_reports(event_id);

            CREATE TABLE city_messages (
                id          TEXT PRIMARY KEY,
                city_id     TEXT NOT NULL,
                author_id   TEXT NOT NULL,
                text        TEXT NOT NULL,
                timestamp   INTEGER NOT NULL
            );
            CREATE INDEX idx_city_messages_city ON city_messages(city_id, timestamp);

            CREATE TABLE canal_messages (
                id          TEXT PRIMARY KEY,
                calendar_id TEXT NOT NULL,
                author_id   TEXT NOT NULL,
                text        TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );
            CREATE INDEX idx_canal_messages_calendar ON canal_messages(calendar_id, created_at);

            CREATE TABLE blocked_chats (
                user_id       TEXT NOT NULL,
                channel_id    TEXT NOT NULL,
                blocked_until INTEGER NOT NULL,
                PRIMARY KEY (user_id, channel_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
