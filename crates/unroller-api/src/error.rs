//! Error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unroller_core::{Error, UnrollError};

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Human readable description of the failure.
    pub message: String,
}

/// Failure of an unroll request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be read or validated.
    #[error(transparent)]
    Request(#[from] Error),

    /// Unrolling failed upstream.
    #[error(transparent)]
    Unroll(#[from] UnrollError),
}

impl ApiError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Request(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Request(_) | Self::Unroll(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorMessage {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use unroller_core::Content;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(Error::missing_id("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::invalid_content("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::config("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let unroll = UnrollError::new(
            "abc",
            Content::new(),
            Error::upstream_status("content-public-read", 500),
        );
        assert_eq!(
            ApiError::from(unroll).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_is_error_display() {
        let err = ApiError::from(Error::missing_id("expected a string"));
        assert_eq!(err.to_string(), "Missing or invalid id field: expected a string");
    }
}
