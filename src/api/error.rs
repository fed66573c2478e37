use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use super::models::ErrorResponse;

/// Every failure the HTTP surface can report.
///
/// The `Display` text is what the client sees in `{"error": "..."}`;
/// internal failures carry no detail; those are logged where they happen.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session token not provided")]
    AuthMissing,
    #[error("Invalid session token")]
    AuthInvalid,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    FeedNotFound(String),
    #[error("Feed already exists")]
    DuplicateSubscription,
    #[error("Subscription does not exist")]
    NotFound,
    #[error("Internal server error")]
    Store,
    #[error("Internal server error")]
    Encoding,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthMissing | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthInvalid => StatusCode::UNAUTHORIZED,
            ApiError::FeedNotFound(_) | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::DuplicateSubscription => StatusCode::CONFLICT,
            ApiError::Store | ApiError::Encoding => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
