//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": {"code", "message"}}` with a
//! status picked from the error's stage.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use vitrine_core::{CreditError, PipelineError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Credit(#[from] CreditError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(e) => match e {
                PipelineError::PayloadTooLarge { .. } | PipelineError::ImageTooLarge { .. } => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                PipelineError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
                e if e.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Credit(e) => match e {
                CreditError::MissingToken | CreditError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                CreditError::Exhausted => StatusCode::PAYMENT_REQUIRED,
                CreditError::UnknownUser => StatusCode::FORBIDDEN,
                CreditError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Pipeline(e) => match e {
                PipelineError::NotAnImage { .. } => "NOT_AN_IMAGE",
                PipelineError::Decode { .. } => "DECODE_FAILED",
                PipelineError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
                PipelineError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
                PipelineError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
                PipelineError::InvalidRequest(_) => "INVALID_REQUEST",
                PipelineError::Timeout { .. } => "TIMEOUT",
                PipelineError::Model { .. } => "MODEL_ERROR",
                PipelineError::Embedding { .. } => "EMBEDDING_ERROR",
                PipelineError::Index { .. } | PipelineError::Catalog { .. } => "INDEX_ERROR",
                PipelineError::Detection { .. } => "DETECTION_ERROR",
                PipelineError::Segmentation { .. } => "SEGMENTATION_ERROR",
            },
            ApiError::Credit(e) => match e {
                CreditError::MissingToken => "MISSING_TOKEN",
                CreditError::InvalidToken(_) => "INVALID_TOKEN",
                CreditError::Exhausted => "CREDITS_EXHAUSTED",
                CreditError::UnknownUser => "UNKNOWN_USER",
                CreditError::Upstream(_) => "CREDIT_STORE_ERROR",
            },
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Inference task failed: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
