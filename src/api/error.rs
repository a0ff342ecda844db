use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::model::ResourceKind;
use crate::store::StoreError;

/// Errors returned to API clients as `{"error": "..."}` bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    InUse {
        message: String,
        used_by: Vec<String>,
    },

    #[error("{0}")]
    Internal(String),

    #[error("Request timed out")]
    Timeout,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::InUse { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Maps a body decoding failure for `kind`.
    pub fn invalid_body(kind: ResourceKind, rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!(
            "Invalid {kind} data: {}",
            rejection.body_text()
        ))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, .. } => {
                ApiError::NotFound(format!("{} not found", kind.title()))
            }
            StoreError::AlreadyExists { kind, .. } => {
                ApiError::Conflict(format!("{} already exists", kind.title()))
            }
            StoreError::InvalidReference {
                kind: ResourceKind::Middleware,
                id,
            } => ApiError::BadRequest(format!("Referenced middleware does not exist: {id}")),
            StoreError::InvalidReference { kind, .. } => {
                ApiError::BadRequest(format!("Referenced {kind} does not exist"))
            }
            StoreError::InUse { kind, used_by, .. } => ApiError::InUse {
                message: format!(
                    "{} is in use by other resources and cannot be deleted",
                    kind.title()
                ),
                used_by,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = match &self {
            ApiError::InUse { message, used_by } => json!({
                "error": message,
                "used_by": used_by,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
