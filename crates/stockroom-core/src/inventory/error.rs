//! Inventory service errors.

use thiserror::Error;

use crate::store::StoreError;

/// Why an inventory operation was refused.
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Product not found: {name}")]
    NotFound {
        name: String,
        /// Closest existing product name, if any is similar enough
        suggestion: Option<String>,
    },

    #[error("Insufficient quantity for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i64,
        available: i64,
    },

    #[error("Product out of stock: {0}")]
    OutOfStock(String),

    #[error("Backend error: {0}")]
    Backend(#[from] StoreError),
}

pub type InventoryResult<T> = Result<T, InventoryError>;
