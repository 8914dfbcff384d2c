//! Stockroom Core Library
//!
//! Inventory ledger for a single clinic/pharmacy stockroom.
//!
//! # Architecture
//!
//! ```text
//!        add_stock            sell_stock           dispense_to_clinic
//!            │                    │                        │
//!            ▼                    ▼                        ▼
//!   ┌─────────────────────────────────────────────────────────────┐
//!   │                     InventoryService                        │
//!   │   validate → timestamp (UTC+1) → atomic store operation     │
//!   └───────────────────────────┬─────────────────────────────────┘
//!                               │ StockStore
//!               ┌───────────────┴───────────────┐
//!               ▼                               ▼
//!     Database (SQLite)                 JsonFileStore
//!   products / p_sold / p_clinic   {products, sold_products, clinic_products}
//! ```
//!
//! # Core Principle
//!
//! **Stock never goes negative, and every unit that leaves the shelf leaves a
//! history record in the same commit.** Short requests are rejected whole.
//!
//! # Modules
//!
//! - [`db`]: SQLite backend
//! - [`store`]: storage trait and the JSON document backend
//! - [`models`]: Domain types (Product, SoldEvent, ClinicEvent, etc.)
//! - [`clock`]: Albania (UTC+1) time source
//! - [`inventory`]: Inventory service and its error taxonomy

pub mod clock;
pub mod db;
pub mod inventory;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use clock::{AlbaniaClock, Clock, FixedClock};
pub use db::Database;
pub use inventory::{InventoryError, InventoryResult, InventoryService};
pub use models::{ClinicEvent, HistoryEntry, HistoryKind, Product, SoldEvent, StockStats};
pub use store::{JsonFileStore, StockStore, StoreError, StoreResult};
