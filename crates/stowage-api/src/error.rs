//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, ApiError>`. Domain errors
//! from the ledgers, the stores, and the claim service convert into
//! `ApiError` via `From`, so `?` renders them consistently (status, JSON
//! body, logging).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stowage_core::file_types::FileTypeError;
use stowage_db::LedgerError;
use stowage_services::ClaimError;
use stowage_storage::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal details go to the log, not the client.
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "internal server error".to_string()
            }
            other => {
                tracing::debug!(error = %other, "Request rejected");
                other.to_string()
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: self.code(),
        });
        (self.status(), body).into_response()
    }
}

impl From<FileTypeError> for ApiError {
    fn from(err: FileTypeError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::EmptyFileName => ApiError::BadRequest(err.to_string()),
            LedgerError::DuplicateName(_) => ApiError::Conflict(err.to_string()),
            LedgerError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::UnknownKind(_) => ApiError::BadRequest(err.to_string()),
            ClaimError::Ledger(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => ApiError::NotFound(format!("no object named '{key}'")),
            StoreError::InvalidKey(msg) => ApiError::BadRequest(format!("invalid file name: {msg}")),
            StoreError::NotPublic(name) => {
                ApiError::BadRequest(format!("container '{name}' is not public"))
            }
            StoreError::Unsupported(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_client_statuses() {
        assert_eq!(
            ApiError::from(LedgerError::EmptyFileName).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LedgerError::DuplicateName("A.png".into())).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn unknown_kind_is_a_bad_request() {
        let err = ApiError::from(ClaimError::UnknownKind("ghost".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "bad_request");
    }

    #[test]
    fn missing_objects_are_not_found() {
        let err = ApiError::from(StoreError::NotFound("A.png".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
