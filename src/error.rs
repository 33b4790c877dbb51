//! Central error taxonomy
//!
//! Every failure a handler can surface goes through one enum so the
//! envelope translation lives in exactly one place.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed required input (400)
    #[error("{0}")]
    Validation(String),

    /// No credential supplied where one is required (401)
    #[error("Authentication failed, please log in to gain access")]
    Unauthenticated,

    /// Signature mismatch or malformed token (401)
    #[error("Invalid authentication token")]
    InvalidCredential,

    /// Token past its expiry (401)
    #[error("Authentication token has expired")]
    Expired,

    /// Valid token but the subject account no longer exists (401)
    #[error("The user of this token has been deleted")]
    StaleCredential,

    /// Caller targeted itself in a toggle (404, matching the source API)
    #[error("{0}")]
    SelfReference(String),

    /// The conditional update touched no record (404)
    #[error("{0}")]
    OperationFailed(String),

    /// Requested entity does not exist (404)
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated
            | Error::InvalidCredential
            | Error::Expired
            | Error::StaleCredential => StatusCode::UNAUTHORIZED,
            Error::SelfReference(_) | Error::OperationFailed(_) | Error::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // 4xx are caller faults ("fail"), 5xx are server faults ("error")
        let kind = if status.is_client_error() { "fail" } else { "error" };

        let message = match &self {
            // Never leak storage internals to the caller
            Error::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "status": kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(err.to_string())
    }
}
