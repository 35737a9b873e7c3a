use thiserror::Error;

/// Malformed identifiers and enum strings coming from storage or the API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Malformed request id: {0}")]
    Shape(String),

    #[error("Weekday out of range: {0}")]
    Weekday(u32),

    #[error("Unknown request status: {0}")]
    Status(String),

    #[error("Unknown user role: {0}")]
    Role(String),
}

/// Caller-side problems with a submission. Raised before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a document type")]
    NoDocumentType,

    #[error("Document type must not be blank")]
    BlankDocumentType,

    #[error("Please select a quantity between {min} and {max}, got {got}")]
    Quantity { got: u32, min: u32, max: u32 },

    #[error("Please select a purpose")]
    NoPurpose,

    #[error("Missing author id")]
    NoAuthor,

    #[error("Attachment too large: {size} bytes (max {max})")]
    AttachmentTooLarge { size: usize, max: usize },
}
