//! SQLite backend for the stockroom ledger.

mod history;
mod products;
mod schema;

pub use schema::*;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use crate::models::{ClinicEvent, Product, SoldEvent, StockStats};
use crate::store::{StockStore, StoreResult, WithdrawOutcome, Withdrawal};

/// How long a writer waits on another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper.
///
/// The connection sits behind a mutex so the handle can be shared across
/// request threads; every write additionally runs in an `IMMEDIATE`
/// transaction so other processes using the same file are serialized too.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> StoreResult<()> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock()?)
    }
}

impl StockStore for Database {
    fn restock(&self, name: &str, quantity: i64) -> StoreResult<Product> {
        self.restock_product(name, quantity)
    }

    fn withdraw(&self, withdrawal: &Withdrawal<'_>) -> StoreResult<WithdrawOutcome> {
        self.withdraw_stock(withdrawal)
    }

    fn products(&self) -> StoreResult<Vec<Product>> {
        self.list_products()
    }

    fn sold_events(&self) -> StoreResult<Vec<SoldEvent>> {
        self.list_sold_events()
    }

    fn clinic_events(&self) -> StoreResult<Vec<ClinicEvent>> {
        self.list_clinic_events()
    }

    fn stats(&self) -> StoreResult<StockStats> {
        self.stock_stats()
    }
}
