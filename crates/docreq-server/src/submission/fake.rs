use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use docreq_shared::{Attachment, RequestId};
use docreq_store::{Notification, Request};

use super::{BackendError, RequestBackend};

#[derive(Debug, thiserror::Error)]
#[error("injected failure: {0}")]
pub struct Injected(&'static str);

/// In-memory backend with switchable failures.
#[derive(Default)]
pub struct FakeBackend {
    counter: Mutex<u64>,
    requests: Mutex<HashMap<RequestId, Request>>,
    attachments: Mutex<HashMap<RequestId, Vec<u8>>>,
    notifications: Mutex<Vec<Notification>>,
    failing_document_types: Mutex<HashSet<String>>,
    fail_allocation: AtomicBool,
    fail_uploads: AtomicBool,
    fail_notify: AtomicBool,
}

impl FakeBackend {
    pub fn fail_allocation(&self) {
        self.fail_allocation.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes_for(&self, document_type: &str) {
        self.failing_document_types
            .lock()
            .unwrap()
            .insert(document_type.to_string());
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    pub fn fail_notify(&self) {
        self.fail_notify.store(true, Ordering::SeqCst);
    }

    pub fn counter(&self) -> u64 {
        *self.counter.lock().unwrap()
    }

    pub fn request(&self, id: &RequestId) -> Option<Request> {
        self.requests.lock().unwrap().get(id).cloned()
    }

    pub fn requests(&self) -> Vec<Request> {
        let mut all: Vec<_> = self.requests.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn attachment(&self, id: &RequestId) -> Option<Vec<u8>> {
        self.attachments.lock().unwrap().get(id).cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestBackend for FakeBackend {
    async fn allocate_sequence(&self) -> Result<u64, BackendError> {
        // Let sibling submissions interleave before the increment.
        tokio::task::yield_now().await;
        if self.fail_allocation.load(Ordering::SeqCst) {
            return Err(Injected("allocation").into());
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        Ok(*counter)
    }

    async fn write_request(&self, request: &Request) -> Result<(), BackendError> {
        tokio::task::yield_now().await;
        if self
            .failing_document_types
            .lock()
            .unwrap()
            .contains(&request.document_type)
        {
            return Err(Injected("write").into());
        }
        self.requests
            .lock()
            .unwrap()
            .insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn upload_attachment(
        &self,
        id: &RequestId,
        attachment: &Attachment,
    ) -> Result<(), BackendError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Injected("upload").into());
        }
        self.attachments
            .lock()
            .unwrap()
            .insert(id.clone(), attachment.data.to_vec());
        Ok(())
    }

    async fn notify(&self, notification: &Notification) -> Result<(), BackendError> {
        if self.fail_notify.load(Ordering::SeqCst) {
            return Err(Injected("notify").into());
        }
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
