//! Persistence seam for the inventory ledger.
//!
//! Two backends implement [`StockStore`]: the SQLite [`Database`](crate::db::Database)
//! and the single-document [`JsonFileStore`]. Both guarantee that a withdrawal's
//! stock decrement and its history record commit together or not at all.

mod json_file;

pub use json_file::*;

use thiserror::Error;

use crate::models::{ClinicEvent, Product, SoldEvent, StockStats};

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),

    #[error("Quantity overflow for product: {0}")]
    Overflow(String),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Where withdrawn stock goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Sold,
    Clinic,
}

/// A request to take stock off the shelf and record where it went.
#[derive(Debug, Clone, Copy)]
pub struct Withdrawal<'a> {
    pub name: &'a str,
    pub quantity: i64,
    pub destination: Destination,
    pub timestamp: &'a str,
}

impl<'a> Withdrawal<'a> {
    /// A sale of `quantity` units.
    pub fn sale(name: &'a str, quantity: i64, timestamp: &'a str) -> Self {
        Self {
            name,
            quantity,
            destination: Destination::Sold,
            timestamp,
        }
    }

    /// A single unit sent to the clinic.
    pub fn clinic(name: &'a str, timestamp: &'a str) -> Self {
        Self {
            name,
            quantity: 1,
            destination: Destination::Clinic,
            timestamp,
        }
    }
}

/// Result of an attempted withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// Stock was decremented and history recorded; holds the updated product.
    Completed(Product),
    /// No product matches the name.
    NotFound,
    /// Not enough stock on hand; nothing was changed.
    Insufficient { available: i64 },
}

/// Durable storage for products and their history.
///
/// Name arguments are matched case-insensitively via [`name_key`](crate::models::name_key).
pub trait StockStore: Send + Sync {
    /// Add units to a product, creating it under `name` if it does not exist.
    fn restock(&self, name: &str, quantity: i64) -> StoreResult<Product>;

    /// Atomically check stock, decrement it and append the history record.
    fn withdraw(&self, withdrawal: &Withdrawal<'_>) -> StoreResult<WithdrawOutcome>;

    /// All products, depleted ones included.
    fn products(&self) -> StoreResult<Vec<Product>>;

    /// Sold history in insertion order.
    fn sold_events(&self) -> StoreResult<Vec<SoldEvent>>;

    /// Clinic history in insertion order.
    fn clinic_events(&self) -> StoreResult<Vec<ClinicEvent>>;

    fn stats(&self) -> StoreResult<StockStats>;
}
