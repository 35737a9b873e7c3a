//! # docreq-server
//!
//! HTTP service for institutional document requests.
//!
//! This binary provides:
//! - **Request submission**: one request per selected document type, each
//!   with an id minted from a shared counter (`YYYY-DD-NNNN`)
//! - **Attachment storage** keyed by request id
//! - **Staff endpoints** for the Hold queue, status changes, user records and
//!   notifications, guarded by a bearer token

mod api;
mod blob_store;
mod clock;
mod config;
mod db;
mod error;
mod submission;

use std::sync::Arc;

use docreq_shared::constants::APP_NAME;
use docreq_store::Database;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::blob_store::AttachmentStore;
use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::submission::{LocalBackend, RequestService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,docreq_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(http_addr = %config.http_addr, "Loaded configuration");
    info!(
        staff_api_enabled = config.staff_token.is_some(),
        max_attachment_size = config.max_attachment_size,
        id_utc_offset = %config.id_utc_offset,
        "Instance settings"
    );

    // -----------------------------------------------------------------------
    // 3. Open storage
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            info!(path = %path.display(), "opening database");
            Database::open_at(path)?
        }
        None => Database::new()?,
    };
    let db = Arc::new(Mutex::new(database));

    let attachments = Arc::new(
        AttachmentStore::new(config.blob_storage_path.clone(), config.max_attachment_size).await?,
    );

    // -----------------------------------------------------------------------
    // 4. Wire the submission workflow
    // -----------------------------------------------------------------------
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = Arc::new(LocalBackend::new(db.clone(), attachments.clone()));
    let service = Arc::new(RequestService::new(
        backend,
        clock.clone(),
        config.id_utc_offset,
        config.max_attachment_size,
    ));

    let http_addr = config.http_addr;
    let app_state = AppState {
        service,
        db,
        attachments,
        clock,
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
