// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    /// Text supplied for a field does not match that field kind's grammar.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Form not found: {0}")]
    FormNotFound(String),

    #[error("Incomplete submission data: {0}")]
    IncompleteSubmissionData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("XML writing failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl AggregateError {
    /// HTTP status the transport layer should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AggregateError::FormNotFound(_) => 404,
            AggregateError::InvalidInput(_) | AggregateError::Decode(_) => 400,
            AggregateError::IncompleteSubmissionData(_)
            | AggregateError::Xml(_)
            | AggregateError::Io(_)
            | AggregateError::Json(_)
            | AggregateError::InvalidUrl(_) => 500,
        }
    }

    /// Whether the failure is the client's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
