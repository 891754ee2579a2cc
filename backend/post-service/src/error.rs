/// Error types for Post Service
///
/// Every failure surfaces to clients as a JSON body `{"error": "..."}` with a
/// status derived from the variant.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced user or post is absent
    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed input
    #[error("{0}")]
    InvalidArgument(String),

    /// Actor is authenticated but may not perform the action
    #[error("{0}")]
    Forbidden(String),

    /// No authenticated actor
    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Asset store failure
    #[error("Asset store error: {0}")]
    Asset(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Database(_) | AppError::Asset(_) | AppError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            // Clients treat a rejected ownership check like a failed auth.
            AppError::Forbidden(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Asset(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

impl From<s3_utils::S3Error> for AppError {
    fn from(err: s3_utils::S3Error) -> Self {
        AppError::Asset(err.to_string())
    }
}
