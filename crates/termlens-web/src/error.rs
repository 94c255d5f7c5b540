//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use termlens_common::{ErrorKind, TermlensError};
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<TermlensError> for ApiError {
    fn from(err: TermlensError) -> Self {
        let status = match err.kind() {
            ErrorKind::MissingInput => StatusCode::BAD_REQUEST,
            ErrorKind::Network => StatusCode::BAD_GATEWAY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        error!(error = %err, "template rendering failed");
        Self::internal(format!("Template error: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_kind() {
        assert_eq!(ApiError::from(TermlensError::missing("x")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(TermlensError::Transport("reset".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::from(TermlensError::not_found("x")).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(TermlensError::Config("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
