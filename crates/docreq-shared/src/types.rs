use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::IdError;

// Human-readable request identifier: "{year}-{weekday:02}-{count:04}"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(String);

impl RequestId {
    /// Build an identifier from its three components.
    ///
    /// `weekday` counts from Sunday (0) to Saturday (6). The count is padded to
    /// four digits but never truncated, so `12345` stays `12345`.
    pub fn format(year: i32, weekday: u32, count: u64) -> Self {
        Self(format!("{year}-{weekday:02}-{count:04}"))
    }

    /// Build an identifier for a counter value allocated at `at`, using the
    /// calendar year and day of week in `at`'s own time zone.
    pub fn for_instant<Tz: TimeZone>(at: &DateTime<Tz>, count: u64) -> Self {
        Self::format(at.year(), at.weekday().num_days_from_sunday(), count)
    }

    /// Split an identifier back into `(year, weekday, count)`.
    pub fn parse(s: &str) -> Result<(i32, u32, u64), IdError> {
        let mut parts = s.split('-');
        let (Some(year), Some(day), Some(count), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(IdError::Shape(s.to_string()));
        };

        if year.is_empty() || day.len() != 2 || count.len() < 4 {
            return Err(IdError::Shape(s.to_string()));
        }
        if ![year, day, count]
            .iter()
            .all(|p| p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(IdError::Shape(s.to_string()));
        }

        let year: i32 = year.parse().map_err(|_| IdError::Shape(s.to_string()))?;
        let weekday: u32 = day.parse().map_err(|_| IdError::Shape(s.to_string()))?;
        let count: u64 = count.parse().map_err(|_| IdError::Shape(s.to_string()))?;

        if weekday > 6 {
            return Err(IdError::Weekday(weekday));
        }
        // Extra leading zeros would alias an id the allocator can produce.
        if Self::format(year, weekday, count).0 != s {
            return Err(IdError::Shape(s.to_string()));
        }

        Ok((year, weekday, count))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RequestId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for RequestId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)?;
        Ok(Self(s))
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

// Opaque author/user reference handed to us by the auth layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a document request.
///
/// New requests always start in [`RequestStatus::OnProcess`]; staff move them
/// to `Hold` or `Completed` afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    OnProcess,
    Hold,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::OnProcess => "ON_PROCESS",
            RequestStatus::Hold => "HOLD",
            RequestStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON_PROCESS" => Ok(RequestStatus::OnProcess),
            "HOLD" => Ok(RequestStatus::Hold),
            "COMPLETED" => Ok(RequestStatus::Completed),
            other => Err(IdError::Status(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "STUDENT",
            UserRole::Staff => "STAFF",
        }
    }
}

impl FromStr for UserRole {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(UserRole::Student),
            "STAFF" => Ok(UserRole::Staff),
            other => Err(IdError::Role(other.to_string())),
        }
    }
}
