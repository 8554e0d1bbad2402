//! Custom error types for the shop service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::accounts::AccountError;
use crate::orders::OrderError;

/// HTTP-facing error
#[derive(Error, Debug)]
pub enum ApiError {
    /// Not found, answered with an empty body
    #[error("Not found")]
    NotFound,

    /// Invalid input or a violated business rule
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Store or infrastructure fault
    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    /// An internal error with context, logged at the point of conversion
    pub fn internal(message: &str, detail: impl std::fmt::Display) -> Self {
        let detail = detail.to_string();
        error!("{}: {}", message, detail);
        ApiError::Internal {
            message: message.to_string(),
            detail,
        }
    }

    pub fn from_order(context: &str, err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => ApiError::NotFound,
            OrderError::Validation(_)
            | OrderError::InsufficientStock { .. }
            | OrderError::Delivered
            | OrderError::AlreadyCancelled => ApiError::BadRequest(err.to_string()),
            OrderError::Store(err) => ApiError::internal(context, err),
        }
    }

    pub fn from_account(context: &str, err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => ApiError::NotFound,
            AccountError::Validation(message) => ApiError::BadRequest(message),
            AccountError::EmailTaken => ApiError::Conflict(err.to_string()),
            AccountError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AccountError::Hashing(err) => ApiError::internal(context, err),
            AccountError::Store(err) => ApiError::internal(context, err),
        }
    }

    pub fn from_store(context: &str, err: DatabaseError) -> Self {
        ApiError::internal(context, err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound => return StatusCode::NOT_FOUND.into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "message": message }))
            }
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "message": message })),
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, json!({ "message": message }))
            }
            ApiError::Internal { message, detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": message, "error": detail }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_errors_map_to_status() {
        let cases = [
            (OrderError::NotFound(1), StatusCode::NOT_FOUND),
            (OrderError::Delivered, StatusCode::BAD_REQUEST),
            (OrderError::AlreadyCancelled, StatusCode::BAD_REQUEST),
            (
                OrderError::InsufficientStock {
                    product: "Laptop".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                OrderError::Store(DatabaseError::Configuration("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from_order("Error creating order", err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_account_errors_map_to_status() {
        let cases = [
            (AccountError::NotFound(1), StatusCode::NOT_FOUND),
            (AccountError::EmailTaken, StatusCode::CONFLICT),
            (AccountError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                AccountError::Validation("Name is required".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from_account("Error registering user", err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_internal_error_carries_context_and_detail() {
        let err = ApiError::from_order(
            "Error creating order",
            OrderError::Store(DatabaseError::Constraint("order_items_product_id_fkey".to_string())),
        );

        match err {
            ApiError::Internal { message, detail } => {
                assert_eq!(message, "Error creating order");
                assert!(detail.contains("order_items_product_id_fkey"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
