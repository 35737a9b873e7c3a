use docreq_shared::{RequestId, SubmissionForm};
use futures::future::join_all;

use super::{RequestDraft, RequestError, RequestService, SubmitError};

impl RequestService {
    /// Create one request per selected document type.
    ///
    /// The form is validated first; an invalid form performs no writes. All
    /// document types then run concurrently and every one is awaited. If any
    /// of them fails the whole submission fails, even though the others are
    /// already persisted. Nothing is rolled back, and resubmitting mints new
    /// ids for every type again.
    pub async fn submit(&self, form: &SubmissionForm) -> Result<Vec<RequestId>, SubmitError> {
        form.validate(self.max_attachment_size)?;

        let drafts: Vec<RequestDraft> = form
            .document_types
            .iter()
            .map(|document_type| RequestDraft {
                document_type: document_type.clone(),
                quantity: form.quantity,
                purpose: form.purpose.clone(),
                author_id: form.author_id.clone(),
                attachment: form.attachment.clone(),
            })
            .collect();

        let results = join_all(drafts.iter().map(|draft| self.create_request(draft))).await;

        let total = results.len();
        let mut created = Vec::with_capacity(total);
        let mut errors: Vec<RequestError> = Vec::new();
        for result in results {
            match result {
                Ok(id) => created.push(id),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            tracing::info!(author = %form.author_id, count = total, "submission complete");
            return Ok(created);
        }

        let failed = errors.len();
        for e in &errors {
            tracing::warn!(author = %form.author_id, error = %e, "document request failed");
        }
        let first = errors.swap_remove(0);

        Err(SubmitError::Partial {
            failed,
            total,
            created,
            first,
        })
    }
}
