//! Store access from async code.
//!
//! rusqlite calls block, and a write may sit in SQLite's busy wait for up to
//! [`docreq_store::database::BUSY_TIMEOUT`] while another connection holds the
//! lock. They run on tokio's blocking pool so the workers stay free.

use std::sync::Arc;

use docreq_store::{Database, StoreError};
use tokio::sync::Mutex;

use crate::error::ServerError;

pub type SharedDb = Arc<Mutex<Database>>;

/// Run `f` with exclusive access to the database on the blocking pool.
pub async fn with_db<T, F>(db: &SharedDb, f: F) -> Result<T, ServerError>
where
    F: FnOnce(&mut Database) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut guard = db.blocking_lock();
        f(&mut guard)
    })
    .await
    .map_err(|e| ServerError::Task(e.to_string()))?;
    Ok(result?)
}
