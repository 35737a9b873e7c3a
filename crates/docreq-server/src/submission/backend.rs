use std::sync::Arc;

use async_trait::async_trait;
use docreq_shared::constants::REQUEST_COUNTER;
use docreq_shared::{Attachment, RequestId};
use docreq_store::{Notification, Request};

use super::BackendError;
use crate::blob_store::AttachmentStore;
use crate::db::{with_db, SharedDb};

/// The capabilities the submission workflow needs from its collaborators.
#[async_trait]
pub trait RequestBackend: Send + Sync {
    /// Atomically increment the shared request counter and return the new
    /// value. Concurrent callers never see the same value.
    async fn allocate_sequence(&self) -> Result<u64, BackendError>;

    /// Point write of a new request keyed by its id.
    async fn write_request(&self, request: &Request) -> Result<(), BackendError>;

    /// Store the attachment under the request id.
    async fn upload_attachment(
        &self,
        id: &RequestId,
        attachment: &Attachment,
    ) -> Result<(), BackendError>;

    /// Append a notification.
    async fn notify(&self, notification: &Notification) -> Result<(), BackendError>;
}

/// SQLite database plus on-disk attachment store.
#[derive(Clone)]
pub struct LocalBackend {
    db: SharedDb,
    attachments: Arc<AttachmentStore>,
}

impl LocalBackend {
    pub fn new(db: SharedDb, attachments: Arc<AttachmentStore>) -> Self {
        Self { db, attachments }
    }
}

#[async_trait]
impl RequestBackend for LocalBackend {
    async fn allocate_sequence(&self) -> Result<u64, BackendError> {
        Ok(with_db(&self.db, |db| db.increment_counter(REQUEST_COUNTER)).await?)
    }

    async fn write_request(&self, request: &Request) -> Result<(), BackendError> {
        let request = request.clone();
        with_db(&self.db, move |db| db.insert_request(&request)).await?;
        Ok(())
    }

    async fn upload_attachment(
        &self,
        id: &RequestId,
        attachment: &Attachment,
    ) -> Result<(), BackendError> {
        let hash = self.attachments.put(id, &attachment.data).await?;
        tracing::info!(
            id = %id,
            file_name = %attachment.file_name,
            size = attachment.len(),
            blake3 = %hash,
            "attachment uploaded"
        );
        Ok(())
    }

    async fn notify(&self, notification: &Notification) -> Result<(), BackendError> {
        let notification = notification.clone();
        with_db(&self.db, move |db| db.insert_notification(&notification)).await?;
        Ok(())
    }
}
