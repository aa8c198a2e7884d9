//! Error types for TakeHome services.

use thiserror::Error;

/// Main error type shared by the TakeHome crates.
#[derive(Error, Debug)]
pub enum TakeHomeError {
    /// Client input failed a shape or range check.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence layer failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid startup configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TakeHomeError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        TakeHomeError::Validation(message.into())
    }

    /// Get error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            TakeHomeError::Validation(_) => "VALIDATION_ERROR",
            TakeHomeError::Unauthorized => "UNAUTHORIZED",
            TakeHomeError::NotFound(_) => "NOT_FOUND",
            TakeHomeError::Database(_) => "DATABASE_ERROR",
            TakeHomeError::Configuration(_) => "CONFIGURATION_ERROR",
            TakeHomeError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller is at fault (as opposed to the service).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TakeHomeError::Validation(_) | TakeHomeError::Unauthorized | TakeHomeError::NotFound(_)
        )
    }
}

/// Result type alias for TakeHome operations.
pub type Result<T> = std::result::Result<T, TakeHomeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = TakeHomeError::validation("amount must be greater than or equal to 0");
        assert_eq!(err.to_string(), "amount must be greater than or equal to 0");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_errors_are_not_client_errors() {
        assert!(!TakeHomeError::Database("pool timed out".into()).is_client_error());
        assert!(!TakeHomeError::Internal("boom".into()).is_client_error());
    }
}
