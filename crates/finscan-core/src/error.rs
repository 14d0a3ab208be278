//! Error types for the finscan-core library.

use thiserror::Error;

/// Main error type for the finscan library.
#[derive(Error, Debug)]
pub enum FinscanError {
    /// Submission or payload failed structural validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The OCR provider rejected or failed the request.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Object storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A background processing task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FinscanError {
    /// Message safe to show to an end user or persist on a failed record.
    pub fn user_message(&self) -> String {
        match self {
            FinscanError::Ocr(e) => e.user_message().to_string(),
            FinscanError::Storage(e) => e.user_message().to_string(),
            FinscanError::Repository(_) => "Could not save the document data".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error is a caller-side validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, FinscanError::Validation(_))
    }

    /// Whether this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FinscanError::NotFound { .. })
    }
}

/// Structural validation failures: raised, never defaulted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No file bytes were submitted.
    #[error("no file was provided")]
    MissingFile,

    /// Partner identifier is empty or missing.
    #[error("partner id is required")]
    MissingPartnerId,

    /// The OCR payload contains no documents.
    #[error("OCR payload contains no documents")]
    NoDocuments,

    /// The first document of the OCR payload has no field map.
    #[error("OCR document has no fields")]
    MissingFields,

    /// The OCR payload could not be read at all.
    #[error("malformed OCR payload: {0}")]
    MalformedPayload(String),
}

/// Error reported by the OCR provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct OcrError {
    /// HTTP-like status code, when the provider returned one.
    pub status: Option<u16>,
    /// Provider-side detail.
    pub message: String,
}

impl OcrError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Stable human-readable description of the failure.
    pub fn user_message(&self) -> &'static str {
        match self.status {
            Some(400) | Some(415) => "The document could not be read by the OCR service",
            Some(401) | Some(403) => "The OCR service rejected the configured credentials",
            Some(404) => "The OCR model or operation was not found",
            Some(408) | Some(504) => "The OCR service timed out",
            Some(409) => "The OCR service reported a conflict, try again",
            Some(429) => "The OCR service is throttling requests, try again later",
            _ => "The OCR service is unavailable",
        }
    }
}

/// Object storage failure.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing the object failed.
    #[error("failed to store object {key}: {reason}")]
    Write { key: String, reason: String },

    /// Serializing a JSON object failed.
    #[error("failed to encode object: {0}")]
    Encode(#[from] serde_json::Error),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        "The file storage service is unavailable"
    }
}

/// Repository failure.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Row targeted by an update does not exist.
    #[error("no {table} row with id {id}")]
    MissingRow { table: &'static str, id: String },

    /// Backend-specific failure.
    #[error("{0}")]
    Backend(String),
}

/// Result type for the finscan library.
pub type Result<T> = std::result::Result<T, FinscanError>;
