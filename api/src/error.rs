//! Error handling and custom error types for the API
//!
//! Maps core validation failures and transport problems onto HTTP status codes
//! with a structured JSON body.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use funding_ledger_core::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

/// Main API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Bad request errors
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Not found errors
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S, field: Option<S>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(|f| f.into()),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the appropriate HTTP status code for the error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    /// Get the error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Check if the error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Log the error appropriately based on type
    pub fn log_error(&self) {
        match self {
            ApiError::Internal { message } => {
                error!("Internal server error: {}", message);
            }
            ApiError::Validation { message, field } => {
                warn!(field = field.as_deref().unwrap_or("-"), "Rejected request: {}", message);
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }
    }

    /// Convert to a structured error response
    ///
    /// The request id travels in the `x-request-id` response header.
    pub fn to_error_response(&self) -> ErrorResponse {
        self.log_error();

        let mut details = HashMap::new();
        if let ApiError::Validation {
            field: Some(field_name),
            ..
        } = self
        {
            details.insert("field".to_string(), field_name.clone().into());
        }

        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details,
            },
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Structured error response for API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,

    /// Response timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Additional error details
    pub details: HashMap<String, serde_json::Value>,
}

/// Custom result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = self.to_error_response();

        if matches!(self, ApiError::Validation { .. }) {
            metrics::increment_counter!("funding_validation_failures_total");
        }

        tracing::debug!(
            "API Error Response: status={}, code={}, message={}",
            status_code,
            error_response.error.code,
            error_response.error.message
        );

        (status_code, Json(error_response)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation {
            message: err.to_string(),
            field: Some(err.field().to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest {
            message: format!("Invalid multipart upload: {}", err.body_text()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal {
            message: format!("Serialization error: {}", err),
        }
    }
}
