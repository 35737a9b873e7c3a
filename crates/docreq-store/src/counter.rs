//! Named monotonic counters.
//!
//! A counter row is created lazily by its first increment and never deleted.
//! [`Database::increment_counter`] is the only write path.

use rusqlite::{params, OptionalExtension, TransactionBehavior};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Atomically add one to counter `name` and return the new value.
    ///
    /// Runs as an `IMMEDIATE` transaction, so the write lock is taken before
    /// the read and concurrent callers (other threads, connections or
    /// processes on the same file) each observe a distinct value. A missing
    /// row counts as 0 and becomes 1.
    pub fn increment_counter(&mut self, name: &str) -> Result<u64> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<i64> = tx
            .query_row(
                "SELECT count FROM counters WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        let next = match current {
            None => {
                tx.execute(
                    "INSERT INTO counters (name, count) VALUES (?1, 1)",
                    params![name],
                )?;
                1
            }
            Some(count) => {
                let next = count + 1;
                tx.execute(
                    "UPDATE counters SET count = ?2 WHERE name = ?1",
                    params![name, next],
                )?;
                next
            }
        };

        tx.commit()?;

        tracing::trace!(counter = name, value = next, "counter incremented");
        Ok(next as u64)
    }

    /// Current value of counter `name`, 0 if it was never incremented.
    pub fn counter_value(&self, name: &str) -> Result<u64> {
        let current: Option<i64> = self
            .conn()
            .query_row(
                "SELECT count FROM counters WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(current.unwrap_or(0) as u64)
    }
}
