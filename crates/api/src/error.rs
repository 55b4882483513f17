//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartIssue, CheckoutError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or unusable caller identity.
    Unauthorized(String),
    /// Cart preview found problems; carries the full list.
    CartInvalid(Vec<CartIssue>),
    /// Checkout logic error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, error_body(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, error_body(msg)),
            ApiError::CartInvalid(issues) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "errors": issues }),
            ),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, error_body(msg))
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, serde_json::Value) {
    match &err {
        CheckoutError::InvalidQuantity { .. }
        | CheckoutError::EmptyCart
        | CheckoutError::MixedCurrency { .. }
        | CheckoutError::TotalOverflow => (StatusCode::BAD_REQUEST, error_body(err.to_string())),
        CheckoutError::ProductNotFound(_) => (StatusCode::NOT_FOUND, error_body(err.to_string())),
        CheckoutError::InsufficientStock { .. } => {
            (StatusCode::CONFLICT, error_body(err.to_string()))
        }
        CheckoutError::Storage(inner) => {
            tracing::error!(error = %inner, "storage failure during checkout");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": "Storage failure, please retry",
                    "retryable": true,
                }),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<store::StoreError> for ApiError {
    fn from(err: store::StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
