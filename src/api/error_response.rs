//! HTTP error response handling for the API
//!
//! Converts domain errors to HTTP responses with a status code and a JSON
//! [`ApiError`] body.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Errors with a known status go through Error::into_response
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Malformed or unexpected JSON bodies are reported as invalid requests
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}
