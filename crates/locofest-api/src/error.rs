use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use locofest_payments::PaymentsError;
use locofest_policy::BlockError;
use locofest_types::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

/// Every refusal a handler can produce. Rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
    #[error(transparent)]
    Payments(#[from] PaymentsError),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Payments(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<BlockError> for ApiError {
    fn from(e: BlockError) -> Self {
        match e {
            BlockError::Unauthenticated => ApiError::Unauthorized(e.to_string()),
            BlockError::Forbidden => ApiError::Forbidden(e.to_string()),
            BlockError::MissingArguments => ApiError::Validation(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Store internals stay in the logs.
            ApiError::Store(e) => {
                error!("Store error: {:#}", e);
                "internal server error".to_string()
            }
            ApiError::Payments(e) => {
                error!("Payments error: {}", e);
                e.to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
