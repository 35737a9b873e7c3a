//! # docreq-store
//!
//! Persistence for the document-request service, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for the request counter,
//! requests, users and notifications.

pub mod counter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod requests;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
