//! FX error types.

use thiserror::Error;

/// Errors raised while fetching a rate table from an upstream provider.
///
/// These never reach HTTP callers: the rate cache logs them and degrades to
/// the last good table.
#[derive(Debug, Error)]
pub enum FxError {
    /// Transport-level failure talking to the provider.
    #[error("Rate provider request failed: {0}")]
    Http(String),

    /// Provider answered with a non-success status.
    #[error("Rate provider returned status {0}")]
    Status(u16),

    /// Body could not be parsed or had no usable `rates` field.
    #[error("Malformed rate response: {0}")]
    MalformedResponse(String),

    /// Fetch did not complete within the configured bound.
    #[error("Rate fetch timed out after {0} ms")]
    Timeout(u64),

    /// Provider-specific failure.
    #[error("Rate provider error: {0}")]
    ProviderError(String),
}

impl FxError {
    /// Get error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Http(_) => "FX_HTTP",
            FxError::Status(_) => "FX_STATUS",
            FxError::MalformedResponse(_) => "FX_MALFORMED",
            FxError::Timeout(_) => "FX_TIMEOUT",
            FxError::ProviderError(_) => "FX_PROVIDER",
        }
    }
}

impl From<reqwest::Error> for FxError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FxError::MalformedResponse(e.to_string())
        } else {
            FxError::Http(e.to_string())
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
