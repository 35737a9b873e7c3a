//! v001 -- Initial schema creation.
//!
//! Creates `counters`, `users`, `requests` and `notifications`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Counters (sequence values behind request ids)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS counters (
    name  TEXT PRIMARY KEY NOT NULL,
    count INTEGER NOT NULL CHECK (count >= 0)
);

-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,   -- id issued by the auth provider
    display_name TEXT NOT NULL,
    email        TEXT,
    role         TEXT NOT NULL,               -- STUDENT | STAFF
    created_at   TEXT NOT NULL                -- RFC-3339
);

-- ----------------------------------------------------------------
-- Requests
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS requests (
    id            TEXT PRIMARY KEY NOT NULL,  -- YYYY-DD-NNNN
    document_type TEXT NOT NULL,
    quantity      INTEGER NOT NULL,
    purpose       TEXT NOT NULL,
    status        TEXT NOT NULL,              -- ON_PROCESS | HOLD | COMPLETED
    author_id     TEXT NOT NULL,              -- no FK: authors may be unknown locally
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status, created_at);
CREATE INDEX IF NOT EXISTS idx_requests_author ON requests(author_id);

-- ----------------------------------------------------------------
-- Notifications (append-only apart from the read flag)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notifications (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    type         TEXT NOT NULL,
    body         TEXT NOT NULL,
    sender_id    TEXT NOT NULL,
    recipient_id TEXT,
    click_action TEXT NOT NULL,
    is_read      INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_created ON notifications(created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
