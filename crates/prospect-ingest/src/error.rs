//! Error types for the ingestion pipeline
//!
//! Record-level problems ([`ValidationError`]) are contained by the importer
//! and only counted. Everything in [`IngestError`] ends the current step.

use prospect_common::EnvError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Pipeline error taxonomy
#[derive(Error, Debug)]
pub enum IngestError {
    /// Missing or invalid configuration, raised before any network or database call
    #[error("Configuration error: {0}. Check your environment variables or .env file.")]
    Config(String),

    /// Caller passed an argument outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport failure or non-2xx response from the search endpoint
    #[error("Search request failed{}: {message}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    /// The response body did not have the expected envelope shape
    #[error("Search response did not match the expected shape: {0}")]
    SchemaMismatch(String),

    /// A durable write did not complete
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The persisted checkpoint could not be interpreted
    #[error("Checkpoint at {path} is corrupt: {reason}. Repair the file or run 'prospect-ingest reset'.")]
    CorruptState { path: String, reason: String },

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure while preparing the profile store
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl IngestError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a request failure with an optional HTTP status
    pub fn request_failed(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: msg.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a corrupt checkpoint error
    pub fn corrupt_state(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptState {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error ends a pagination run as `Aborted` rather than failing setup.
    ///
    /// A malformed envelope is handled like a failed request.
    pub fn is_page_failure(&self) -> bool {
        matches!(self, Self::RequestFailed { .. } | Self::SchemaMismatch(_))
    }
}

impl From<EnvError> for IngestError {
    fn from(err: EnvError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        Self::RequestFailed {
            status,
            message: err.to_string(),
        }
    }
}

/// Why a raw record was rejected
///
/// Not part of [`IngestError`]: the importer counts these per record and
/// never lets one end a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("required field 'name' is missing")]
    MissingName,

    #[error("required field 'name' is empty")]
    EmptyName,

    #[error("field has the wrong type: {0}")]
    WrongType(String),
}
