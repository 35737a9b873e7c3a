use docreq_shared::{RequestId, RequestStatus};
use docreq_store::Request;

use super::{RequestDraft, RequestError, RequestService};

impl RequestService {
    /// Create one request: allocate an id, write the record as `ON_PROCESS`,
    /// upload the attachment if there is one, then notify.
    ///
    /// Steps run strictly in order and are not atomic together. An upload
    /// failure leaves the written request in place and is returned as
    /// [`RequestError::Upload`]; a notification failure is only logged.
    pub async fn create_request(&self, draft: &RequestDraft) -> Result<RequestId, RequestError> {
        let allocated = self.allocate_id().await?;
        let id = allocated.id;

        let request = Request {
            id: id.clone(),
            document_type: draft.document_type.clone(),
            quantity: draft.quantity,
            purpose: draft.purpose.clone(),
            status: RequestStatus::OnProcess,
            author_id: draft.author_id.clone(),
            created_at: allocated.at,
            updated_at: allocated.at,
        };

        self.backend
            .write_request(&request)
            .await
            .map_err(|source| RequestError::Persistence {
                id: id.clone(),
                source,
            })?;

        tracing::info!(
            id = %id,
            document_type = %draft.document_type,
            author = %draft.author_id,
            "request created"
        );

        if let Some(attachment) = &draft.attachment {
            self.backend
                .upload_attachment(&id, attachment)
                .await
                .map_err(|source| RequestError::Upload {
                    id: id.clone(),
                    source,
                })?;
        }

        self.notify(&draft.author_id).await;

        Ok(id)
    }
}
