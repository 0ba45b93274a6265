//! Error types for environment lookups

use thiserror::Error;

/// Result type alias for environment lookups
pub type EnvResult<T> = std::result::Result<T, EnvError>;

/// Raised when a variable is missing or cannot be interpreted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("Environment variable {0} is required but not set")]
    Missing(String),

    #[error("Environment variable {0} is set but empty")]
    Empty(String),

    #[error("Environment variable {name} has invalid value '{value}': {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

impl EnvError {
    /// Create an invalid value error
    pub fn invalid(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
