//! The user-facing submission form and its validation rules.
//!
//! A form can name several document types at once; each one becomes its own
//! request sharing the same quantity, purpose and attachment.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_QUANTITY, MIN_QUANTITY};
use crate::error::ValidationError;
use crate::types::UserId;

/// An uploaded file. Cloning is cheap (`Bytes` is reference counted), which
/// matters because the same attachment is stored once per created request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionForm {
    pub document_types: Vec<String>,
    pub quantity: u32,
    pub purpose: String,
    pub author_id: UserId,
    #[serde(skip)]
    pub attachment: Option<Attachment>,
}

impl SubmissionForm {
    /// Check the form the same way the request modal did before submitting.
    ///
    /// The first failing rule wins, in the order: document types, quantity,
    /// purpose, author, attachment size.
    pub fn validate(&self, max_attachment_size: usize) -> Result<(), ValidationError> {
        if self.document_types.is_empty() {
            return Err(ValidationError::NoDocumentType);
        }
        if self.document_types.iter().any(|t| t.trim().is_empty()) {
            return Err(ValidationError::BlankDocumentType);
        }
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&self.quantity) {
            return Err(ValidationError::Quantity {
                got: self.quantity,
                min: MIN_QUANTITY,
                max: MAX_QUANTITY,
            });
        }
        if self.purpose.trim().is_empty() {
            return Err(ValidationError::NoPurpose);
        }
        if self.author_id.as_str().trim().is_empty() {
            return Err(ValidationError::NoAuthor);
        }
        if let Some(attachment) = &self.attachment {
            if attachment.len() > max_attachment_size {
                return Err(ValidationError::AttachmentTooLarge {
                    size: attachment.len(),
                    max: max_attachment_size,
                });
            }
        }
        Ok(())
    }
}
