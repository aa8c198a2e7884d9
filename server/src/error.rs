//! HTTP mapping of service errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use takehome_common::TakeHomeError;
use tracing::error;

/// Error returned by route handlers, rendered as `{ "message": ... }`.
#[derive(Debug)]
pub struct ApiError {
    error: TakeHomeError,
    /// Body message for server-side failures; their cause is only logged.
    public_message: &'static str,
}

impl ApiError {
    pub fn new(error: TakeHomeError) -> Self {
        Self {
            error,
            public_message: "Internal server error",
        }
    }

    /// Replace the generic message shown for 5xx responses.
    pub fn with_public_message(mut self, message: &'static str) -> Self {
        self.public_message = message;
        self
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            TakeHomeError::Validation(_) => StatusCode::BAD_REQUEST,
            TakeHomeError::Unauthorized => StatusCode::UNAUTHORIZED,
            TakeHomeError::NotFound(_) => StatusCode::NOT_FOUND,
            TakeHomeError::Database(_)
            | TakeHomeError::Configuration(_)
            | TakeHomeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TakeHomeError> for ApiError {
    fn from(error: TakeHomeError) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if self.error.is_client_error() {
            self.error.to_string()
        } else {
            error!(
                error = %self.error,
                code = self.error.error_code(),
                "Request failed"
            );
            self.public_message.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(TakeHomeError::validation("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(TakeHomeError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TakeHomeError::NotFound("user".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TakeHomeError::Database("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_server_error_hides_cause() {
        let response = ApiError::from(TakeHomeError::Database("password=hunter2".into()))
            .with_public_message("Failed to update profile")
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "message": "Failed to update profile" }));
    }
}
