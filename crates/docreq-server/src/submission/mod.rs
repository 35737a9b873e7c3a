//! The request submission workflow.
//!
//! Per selected document type: allocate an id from the shared counter, write
//! the request, upload the optional attachment, then append a notification.
//! Document types of one submission run concurrently; there is no rollback
//! across steps or across siblings.

mod allocator;
mod backend;
mod notifier;
mod orchestrator;
mod writer;

#[cfg(test)]
mod fake;

use std::sync::Arc;

use chrono::FixedOffset;
use docreq_shared::{Attachment, RequestId, UserId, ValidationError};
use thiserror::Error;

use crate::clock::Clock;

pub use backend::{LocalBackend, RequestBackend};

/// Error type returned by [`RequestBackend`] implementations.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of one request's creation.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The counter transaction failed; nothing was written.
    #[error("Failed to allocate request id: {0}")]
    Allocation(#[source] BackendError),

    /// The request record could not be written. The id is burnt.
    #[error("Failed to write request {id}: {source}")]
    Persistence {
        id: RequestId,
        #[source]
        source: BackendError,
    },

    /// The request record exists but its attachment does not.
    #[error("Failed to upload attachment for {id}: {source}")]
    Upload {
        id: RequestId,
        #[source]
        source: BackendError,
    },
}

/// Failure of a whole submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// At least one document type failed. Requests listed in `created`
    /// finished every step and stay persisted.
    #[error("{failed} of {total} document requests failed, first error: {first}")]
    Partial {
        failed: usize,
        total: usize,
        created: Vec<RequestId>,
        first: RequestError,
    },
}

/// Input for a single request: one document type out of a submission.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub document_type: String,
    pub quantity: u32,
    pub purpose: String,
    pub author_id: UserId,
    pub attachment: Option<Attachment>,
}

/// Entry point for creating requests. Cheap to share behind an `Arc`.
pub struct RequestService {
    backend: Arc<dyn RequestBackend>,
    clock: Arc<dyn Clock>,
    id_offset: FixedOffset,
    max_attachment_size: usize,
}

impl RequestService {
    pub fn new(
        backend: Arc<dyn RequestBackend>,
        clock: Arc<dyn Clock>,
        id_offset: FixedOffset,
        max_attachment_size: usize,
    ) -> Self {
        Self {
            backend,
            clock,
            id_offset,
            max_attachment_size,
        }
    }
}
