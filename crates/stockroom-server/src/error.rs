use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stockroom_core::InventoryError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed request body")]
    MalformedPayload,

    /// Rejected name on an endpoint that takes no quantity.
    #[error("Invalid product name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure body shared by every API endpoint.
#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedPayload | ApiError::InvalidName(_) => StatusCode::BAD_REQUEST,
            ApiError::Inventory(e) => match e {
                InventoryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                InventoryError::NotFound { .. } => StatusCode::NOT_FOUND,
                InventoryError::InsufficientStock { .. } | InventoryError::OutOfStock(_) => {
                    StatusCode::CONFLICT
                }
                InventoryError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client. Backend details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::MalformedPayload | ApiError::InvalidName(_) => self.to_string(),
            ApiError::Inventory(e) => match e {
                InventoryError::InvalidArgument(reason) => {
                    format!("Invalid product name or quantity: {}", reason)
                }
                InventoryError::NotFound {
                    suggestion: Some(suggestion),
                    ..
                } => format!("Product not found (did you mean '{}'?)", suggestion),
                InventoryError::NotFound { .. } => "Product not found".into(),
                InventoryError::InsufficientStock { available, .. } => {
                    format!("Insufficient quantity (available: {})", available)
                }
                InventoryError::OutOfStock(_) => "Product out of stock".into(),
                InventoryError::Backend(_) => "Database error".into(),
            },
            ApiError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl ApiError {
    /// Report argument errors in terms of the product name only.
    pub fn name_only(self) -> Self {
        match self {
            ApiError::Inventory(InventoryError::InvalidArgument(reason)) => {
                ApiError::InvalidName(reason)
            }
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }

        let body = ApiFailure {
            success: false,
            error: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}
