use docreq_shared::{UserId, UserRole};
use rusqlite::params;

use crate::database::{conversion_error, not_found, parse_timestamp, Database};
use crate::error::Result;
use crate::models::User;

impl Database {
    /// Insert a user or refresh the profile fields of an existing one.
    /// `created_at` of an existing record is preserved.
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, display_name, email, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                email        = excluded.email,
                role         = excluded.role",
            params![
                user.id.as_str(),
                user.display_name,
                user.email,
                user.role.as_str(),
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, display_name, email, role, created_at FROM users WHERE id = ?1",
                params![id.as_str()],
                row_to_user,
            )
            .map_err(not_found)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, display_name, email, role, created_at
             FROM users
             ORDER BY display_name ASC, id ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let display_name: String = row.get(1)?;
    let email: Option<String> = row.get(2)?;
    let role_str: String = row.get(3)?;
    let created_str: String = row.get(4)?;

    let role = role_str
        .parse::<UserRole>()
        .map_err(|e| conversion_error(3, e))?;

    Ok(User {
        id: UserId(id),
        display_name,
        email,
        role,
        created_at: parse_timestamp(4, &created_str)?,
    })
}
