//! History records for stock leaving the shelf.

use serde::{Deserialize, Serialize};

/// A completed sale. One row per sale, carrying the units sold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoldEvent {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub timestamp: String,
}

/// One unit handed over to the clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClinicEvent {
    pub id: i64,
    pub product_id: i64,
    pub timestamp: String,
}

/// Which history ledger to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Sold,
    Clinic,
}

/// History row projected for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Product display name
    pub name: String,
    /// Units sold; absent for clinic transfers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    /// UTC+1 wall-clock time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
}

/// Ledger-wide counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockStats {
    pub total_units_in_stock: i64,
    pub total_sold_events: i64,
    pub total_clinic_events: i64,
}
