use chrono::{DateTime, Utc};
use docreq_shared::{RequestId, RequestStatus, UserId, UserRole};
use rusqlite::{params, ErrorCode};

use crate::database::{conversion_error, not_found, parse_timestamp, Database};
use crate::error::{Result, StoreError};
use crate::models::{Request, RequestWithAuthor, User};

const REQUEST_COLUMNS: &str =
    "r.id, r.document_type, r.quantity, r.purpose, r.status, r.author_id, r.created_at, r.updated_at";

impl Database {
    /// Point write of a new request under its caller-chosen id.
    pub fn insert_request(&self, request: &Request) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO requests
                    (id, document_type, quantity, purpose, status, author_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    request.id.as_str(),
                    request.document_type,
                    request.quantity,
                    request.purpose,
                    request.status.as_str(),
                    request.author_id.as_str(),
                    request.created_at.to_rfc3339(),
                    request.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::AlreadyExists(request.id.to_string())
                }
                other => StoreError::Sqlite(other),
            })?;

        tracing::debug!(id = %request.id, status = %request.status, "request stored");
        Ok(())
    }

    pub fn get_request(&self, id: &RequestId) -> Result<Request> {
        self.conn()
            .query_row(
                &format!("SELECT {REQUEST_COLUMNS} FROM requests r WHERE r.id = ?1"),
                params![id.as_str()],
                row_to_request,
            )
            .map_err(not_found)
    }

    pub fn request_exists(&self, id: &RequestId) -> Result<bool> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM requests WHERE id = ?1)",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Requests in `status`, oldest first.
    pub fn list_requests_by_status(&self, status: RequestStatus) -> Result<Vec<Request>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests r
             WHERE r.status = ?1
             ORDER BY r.created_at ASC, r.id ASC"
        ))?;

        let rows = stmt.query_map(params![status.as_str()], row_to_request)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Everything one author has submitted, newest first.
    pub fn list_requests_for_author(&self, author_id: &UserId) -> Result<Vec<Request>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests r
             WHERE r.author_id = ?1
             ORDER BY r.created_at DESC, r.id DESC"
        ))?;

        let rows = stmt.query_map(params![author_id.as_str()], row_to_request)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Requests in `status` joined with their author's user record, oldest
    /// first. This is the staff queue view (e.g. everything on `HOLD`).
    pub fn list_requests_with_authors(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<RequestWithAuthor>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REQUEST_COLUMNS}, u.id, u.display_name, u.email, u.role, u.created_at
             FROM requests r
             LEFT JOIN users u ON u.id = r.author_id
             WHERE r.status = ?1
             ORDER BY r.created_at ASC, r.id ASC"
        ))?;

        let rows = stmt.query_map(params![status.as_str()], |row| {
            let request = row_to_request(row)?;
            let author = match row.get::<_, Option<String>>(8)? {
                None => None,
                Some(id) => {
                    let role: String = row.get(11)?;
                    let created: String = row.get(12)?;
                    Some(User {
                        id: UserId(id),
                        display_name: row.get(9)?,
                        email: row.get(10)?,
                        role: role
                            .parse::<UserRole>()
                            .map_err(|e| conversion_error(11, e))?,
                        created_at: parse_timestamp(12, &created)?,
                    })
                }
            };
            Ok(RequestWithAuthor { request, author })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Move a request to `status` and stamp `updated_at`. Returns the updated
    /// record, or [`StoreError::NotFound`].
    pub fn update_request_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<Request> {
        let affected = self.conn().execute(
            "UPDATE requests SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.as_str(), status.as_str(), at.to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::info!(id = %id, status = %status, "request status changed");
        self.get_request(id)
    }
}

fn row_to_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<Request> {
    let id_str: String = row.get(0)?;
    let document_type: String = row.get(1)?;
    let quantity: u32 = row.get(2)?;
    let purpose: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let author_id: String = row.get(5)?;
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;

    let id = id_str
        .parse::<RequestId>()
        .map_err(|e| conversion_error(0, e))?;
    let status = status_str
        .parse::<RequestStatus>()
        .map_err(|e| conversion_error(4, e))?;

    Ok(Request {
        id,
        document_type,
        quantity,
        purpose,
        status,
        author_id: UserId(author_id),
        created_at: parse_timestamp(6, &created_str)?,
        updated_at: parse_timestamp(7, &updated_str)?,
    })
}
