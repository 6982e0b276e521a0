//! Request error taxonomy and HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the prediction pipeline.
///
/// Every variant is caught at the endpoint boundary and converted into a
/// `{"error": <message>}` JSON body; nothing here crashes the process.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The classifier failed to load at startup
    #[error("Model not loaded")]
    Config,

    /// The upload itself is unusable (missing file, bad extension, too large)
    #[error("{0}")]
    Request(String),

    /// Required columns are absent from the uploaded table
    #[error("Missing required columns: {}", .0.join(", "))]
    Schema(Vec<String>),

    /// Column values fail validation or preprocessing
    #[error("{0}")]
    Validation(String),

    /// The model call itself failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Anything else on the server side (I/O, malformed CSV, ...)
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP status for the error class: 400 for caller-supplied-data
    /// faults, 500 for server/model faults.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Request(_) | ServiceError::Schema(_) | ServiceError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Config | ServiceError::Inference(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        ServiceError::Internal(format!("Failed to parse CSV: {err}"))
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Internal(err.to_string())
    }
}
