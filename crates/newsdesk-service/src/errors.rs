use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    #[error("news item not found")]
    NotFound,

    #[error("news item has already been reviewed")]
    AlreadyReviewed,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("{service} failure: {message}")]
    Upstream {
        service: &'static str,
        message: String,
        detail: Option<serde_json::Value>,
    },

    #[error("corrupt intermediate artifact: {0}")]
    Integrity(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        ApiError::Upstream {
            service,
            message: message.into(),
            detail: None,
        }
    }

    pub fn upstream_with_detail(
        service: &'static str,
        message: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        ApiError::Upstream {
            service,
            message: message.into(),
            detail: Some(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, detail) = match self {
            ApiError::Validation(ref err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            ApiError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), None),
            ApiError::AlreadyReviewed => (StatusCode::CONFLICT, self.to_string(), None),
            ApiError::Database(ref err) => {
                // Log the detailed error but don't expose it to the client
                error!(error = %err, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::Upstream {
                service,
                ref message,
                ref detail,
            } => {
                error!(service, error = %message, "Upstream service failure");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("{service} failure: {message}"),
                    detail.clone(),
                )
            }
            ApiError::Integrity(ref msg) => {
                error!(error = %msg, "Integrity check failed, aborting pipeline");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None)
            }
            ApiError::Io(ref err) => {
                error!(error = %err, "Filesystem error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
        };

        let body = match detail {
            Some(detail) => Json(json!({ "error": error_message, "details": detail })),
            None => Json(json!({ "error": error_message })),
        };

        (status, body).into_response()
    }
}
