//! HTTP mapping for library errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::Error;

/// Error returned by API handlers.
///
/// Gate outcomes keep their fixed status and message. Everything else is
/// classified through the `is_*` helpers on [`Error`].
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::Auth(auth) => auth.status_code(),
            err if err.is_validation_error() => StatusCode::BAD_REQUEST,
            err if err.is_not_found() => StatusCode::NOT_FOUND,
            err if err.is_conflict() => StatusCode::CONFLICT,
            err if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E: Into<Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Error::Auth(auth) = self.0 {
            return auth.into_response();
        }

        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(module = self.0.module(), error = %self.0, "Request failed");
            match status {
                StatusCode::SERVICE_UNAVAILABLE => "Service Unavailable".to_string(),
                _ => "Internal Server Error".to_string(),
            }
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
