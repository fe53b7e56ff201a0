//! Error types for the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mailgate_store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Failed to bind to the configured address.
    #[error("Failed to bind http server to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// The server stopped with a runtime error.
    #[error("Http server error: {0}")]
    Server(String),
}

/// A repository failure on its way out as a JSON response.
///
/// Handlers bubble [`StoreError`]s into this with `?`; the status comes
/// straight from the error's classification. Internal failures are
/// logged here and masked so backend details never reach a client.
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() {
            error!(error = %self.0, "Request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
