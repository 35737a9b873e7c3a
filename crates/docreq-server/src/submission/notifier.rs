use docreq_shared::constants::{
    NOTIFICATION_ACTION_REQUEST, NOTIFICATION_BODY_REQUEST, NOTIFICATION_TYPE_REQUEST,
};
use docreq_shared::UserId;
use docreq_store::Notification;
use uuid::Uuid;

use super::RequestService;

impl RequestService {
    /// Append a "has created a request" notification from `sender`.
    ///
    /// Never fails: a missing notification must not fail a request that is
    /// already persisted, so errors are logged and dropped here.
    pub async fn notify(&self, sender: &UserId) {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: NOTIFICATION_TYPE_REQUEST.to_string(),
            body: NOTIFICATION_BODY_REQUEST.to_string(),
            sender_id: sender.clone(),
            // TODO: resolve the staff recipients once user roles drive routing.
            recipient_id: None,
            click_action: NOTIFICATION_ACTION_REQUEST.to_string(),
            is_read: false,
            created_at: self.clock.now(),
        };

        if let Err(e) = self.backend.notify(&notification).await {
            tracing::error!(sender = %sender, error = %e, "failed to create request notification");
        }
    }
}
