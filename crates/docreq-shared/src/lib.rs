//! # docreq-shared
//!
//! Types shared by the store and the server: request identifiers, statuses,
//! the submission form and the error taxonomy for caller-side mistakes.

pub mod constants;
pub mod error;
pub mod form;
pub mod types;

pub use error::{IdError, ValidationError};
pub use form::{Attachment, SubmissionForm};
pub use types::{RequestId, RequestStatus, UserId, UserRole};
