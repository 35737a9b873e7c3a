use chrono::{DateTime, Utc};
use docreq_shared::UserId;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{conversion_error, parse_timestamp, Database};
use crate::error::Result;
use crate::models::Notification;

impl Database {
    /// Append a notification. Ids are random, so inserts never collide.
    pub fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications
                (id, type, body, sender_id, recipient_id, click_action, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                notification.id.to_string(),
                notification.kind,
                notification.body,
                notification.sender_id.as_str(),
                notification.recipient_id.as_ref().map(|r| r.as_str()),
                notification.click_action,
                notification.is_read as i32,
                notification.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Notifications newest first, optionally only the unread ones.
    pub fn list_notifications(&self, unread_only: bool) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, type, body, sender_id, recipient_id, click_action, is_read, created_at
             FROM notifications
             WHERE (?1 = 0 OR is_read = 0)
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![unread_only as i32], row_to_notification)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn mark_notification_read(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let id_str: String = row.get(0)?;
    let kind: String = row.get(1)?;
    let body: String = row.get(2)?;
    let sender_id: String = row.get(3)?;
    let recipient_id: Option<String> = row.get(4)?;
    let click_action: String = row.get(5)?;
    let is_read_int: i32 = row.get(6)?;
    let created_str: String = row.get(7)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let created_at: DateTime<Utc> = parse_timestamp(7, &created_str)?;

    Ok(Notification {
        id,
        kind,
        body,
        sender_id: UserId(sender_id),
        recipient_id: recipient_id.map(UserId),
        click_action,
        is_read: is_read_int != 0,
        created_at,
    })
}
