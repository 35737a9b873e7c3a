//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.

use chrono::{DateTime, Utc};
use docreq_shared::{RequestId, RequestStatus, UserId, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A request for one document type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Derived identifier, see [`RequestId`].
    pub id: RequestId,
    /// Free-form document type label, e.g. "Transcript of Records".
    pub document_type: String,
    pub quantity: u32,
    pub purpose: String,
    pub status: RequestStatus,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at` until the first status change.
    pub updated_at: DateTime<Utc>,
}

/// A request together with its author's user record, as shown to staff.
/// `author` is `None` when no user record exists for `request.author_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestWithAuthor {
    #[serde(flatten)]
    pub request: Request,
    pub author: Option<User>,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub body: String,
    pub sender_id: UserId,
    /// Always `None` for request notifications; nothing resolves recipients yet.
    pub recipient_id: Option<UserId>,
    pub click_action: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
