/// Application name
pub const APP_NAME: &str = "docreq";

/// Name of the counter row that feeds request ids
pub const REQUEST_COUNTER: &str = "documents";

/// Smallest quantity a single request may ask for
pub const MIN_QUANTITY: u32 = 1;

/// Largest quantity a single request may ask for
pub const MAX_QUANTITY: u32 = 5;

/// Maximum attachment size in bytes (50 MiB)
pub const MAX_ATTACHMENT_SIZE: usize = 50 * 1024 * 1024;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Notification fields written for every new request
pub const NOTIFICATION_TYPE_REQUEST: &str = "REQUEST";
pub const NOTIFICATION_BODY_REQUEST: &str = "has created a request";
pub const NOTIFICATION_ACTION_REQUEST: &str = "/on-process";
