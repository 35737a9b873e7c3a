use chrono::{DateTime, Utc};
use docreq_shared::RequestId;

use super::{RequestError, RequestService};

/// A freshly minted id and the instant it was minted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedId {
    pub id: RequestId,
    pub at: DateTime<Utc>,
}

impl RequestService {
    /// Take the next counter value and format it as
    /// `{year}-{day of week:02}-{count:04}`.
    ///
    /// Year and day of week come from the clock, read after the counter
    /// transaction, in the configured id offset. The counter itself ignores
    /// both, so uniqueness rests on the counter never being reset.
    pub async fn allocate_id(&self) -> Result<AllocatedId, RequestError> {
        let count = self
            .backend
            .allocate_sequence()
            .await
            .map_err(RequestError::Allocation)?;

        let at = self.clock.now();
        let id = RequestId::for_instant(&at.with_timezone(&self.id_offset), count);

        tracing::debug!(id = %id, count, "allocated request id");
        Ok(AllocatedId { id, at })
    }
}
