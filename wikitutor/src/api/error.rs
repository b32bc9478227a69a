//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};
use wikitutor_kb::KbError;

/// Error returned by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Kb(#[from] KbError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Kb(e) if e.is_caller_error() => StatusCode::BAD_REQUEST,
            // Misses split into upstream failures and absent content
            ApiError::Kb(e) if e.is_miss() => match e {
                KbError::MalformedGeneratorResponse(_) | KbError::Generator(_) => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::NOT_FOUND,
            },
            ApiError::Kb(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            debug!("Request rejected ({}): {}", status, self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
