//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use docreq_shared::constants::{DEFAULT_HTTP_PORT, MAX_ATTACHMENT_SIZE};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: the platform data directory (see `docreq_store::database::default_path`).
    pub database_path: Option<PathBuf>,

    /// Directory under which attachments are stored.
    /// Env: `BLOB_STORAGE_PATH`
    /// Default: `./blobs`
    pub blob_storage_path: PathBuf,

    /// Maximum attachment size in bytes.
    /// Env: `MAX_ATTACHMENT_SIZE`
    /// Default: 50 MiB
    pub max_attachment_size: usize,

    /// Bearer token required on staff endpoints.
    /// Env: `STAFF_TOKEN`
    /// Default: empty (staff API disabled).
    pub staff_token: Option<String>,

    /// UTC offset used to pick the year and day of week baked into request ids.
    /// Env: `ID_UTC_OFFSET` (e.g. `+08:00`)
    /// Default: `+00:00`
    pub id_utc_offset: FixedOffset,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            blob_storage_path: PathBuf::from("./blobs"),
            max_attachment_size: MAX_ATTACHMENT_SIZE,
            staff_token: None,
            id_utc_offset: utc(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(path) = lookup("BLOB_STORAGE_PATH") {
            config.blob_storage_path = PathBuf::from(path);
        }

        if let Some(val) = lookup("MAX_ATTACHMENT_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_attachment_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_ATTACHMENT_SIZE, using default"),
            }
        }

        if let Some(token) = lookup("STAFF_TOKEN") {
            if !token.is_empty() {
                config.staff_token = Some(token);
            }
        }

        if let Some(val) = lookup("ID_UTC_OFFSET") {
            match parse_utc_offset(&val) {
                Ok(offset) => config.id_utc_offset = offset,
                Err(e) => {
                    tracing::warn!(value = %val, error = %e, "Invalid ID_UTC_OFFSET, using UTC")
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse `Z`, `+HH:MM`, `-HH:MM` or `+HHMM` into a fixed offset.
fn parse_utc_offset(raw: &str) -> Result<FixedOffset, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return Ok(utc());
    }

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(format!("offset must start with + or -: {raw}")),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected HH:MM, got {rest}"));
    }

    let hours: i32 = digits[..2].parse().map_err(|e| format!("{e}"))?;
    let minutes: i32 = digits[2..].parse().map_err(|e| format!("{e}"))?;
    if minutes >= 60 {
        return Err(format!("minutes out of range: {minutes}"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset out of range: {raw}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.max_attachment_size, 50 * 1024 * 1024);
        assert!(config.staff_token.is_none());
        assert_eq!(config.id_utc_offset.local_minus_utc(), 0);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/docreq.db"),
            ("MAX_ATTACHMENT_SIZE", "1024"),
            ("STAFF_TOKEN", "s3cret"),
            ("ID_UTC_OFFSET", "+08:00"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/docreq.db")));
        assert_eq!(config.max_attachment_size, 1024);
        assert_eq!(config.staff_token.as_deref(), Some("s3cret"));
        assert_eq!(config.id_utc_offset.local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("-05:30").unwrap().local_minus_utc(), -(5 * 3600 + 1800));
        assert_eq!(parse_utc_offset("+0900").unwrap().local_minus_utc(), 9 * 3600);
        assert!(parse_utc_offset("08:00").is_err());
        assert!(parse_utc_offset("+8").is_err());
        assert!(parse_utc_offset("+08:75").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = load(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("MAX_ATTACHMENT_SIZE", "0"),
            ("STAFF_TOKEN", ""),
            ("ID_UTC_OFFSET", "Mars/Olympus"),
        ]);
        let default = ServerConfig::default();
        assert_eq!(config.http_addr, default.http_addr);
        assert_eq!(config.max_attachment_size, default.max_attachment_size);
        assert!(config.staff_token.is_none());
        assert_eq!(config.id_utc_offset, default.id_utc_offset);
    }
}
