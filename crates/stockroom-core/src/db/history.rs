//! Withdrawals and history database operations.

use rusqlite::{params, TransactionBehavior};

use super::products::find_by_key;
use super::Database;
use crate::models::{name_key, ClinicEvent, SoldEvent, StockStats};
use crate::store::{Destination, StoreResult, WithdrawOutcome, Withdrawal};

impl Database {
    /// Decrement stock and append the matching history row in one transaction.
    ///
    /// The decrement is a conditional update, so it can never take the
    /// quantity below zero even if the earlier check raced another writer.
    pub fn withdraw_stock(&self, withdrawal: &Withdrawal<'_>) -> StoreResult<WithdrawOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut product) = find_by_key(&tx, &name_key(withdrawal.name))? else {
            return Ok(WithdrawOutcome::NotFound);
        };
        if product.quantity < withdrawal.quantity {
            return Ok(WithdrawOutcome::Insufficient {
                available: product.quantity,
            });
        }

        let updated = tx.execute(
            "UPDATE products SET quantity = quantity - ?2 WHERE id = ?1 AND quantity >= ?2",
            params![product.id, withdrawal.quantity],
        )?;
        if updated == 0 {
            return Ok(WithdrawOutcome::Insufficient {
                available: product.quantity,
            });
        }

        match withdrawal.destination {
            Destination::Sold => {
                tx.execute(
                    "INSERT INTO p_sold (p_id, quantity, sold_at) VALUES (?1, ?2, ?3)",
                    params![product.id, withdrawal.quantity, withdrawal.timestamp],
                )?;
            }
            Destination::Clinic => {
                tx.execute(
                    "INSERT INTO p_clinic (p_id, sent_at) VALUES (?1, ?2)",
                    params![product.id, withdrawal.timestamp],
                )?;
            }
        }

        tx.commit()?;
        product.quantity -= withdrawal.quantity;
        Ok(WithdrawOutcome::Completed(product))
    }

    /// Sold history in insertion order.
    pub fn list_sold_events(&self) -> StoreResult<Vec<SoldEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, p_id, quantity, sold_at FROM p_sold ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(SoldEvent {
                id: row.get(0)?,
                product_id: row.get(1)?,
                quantity: row.get(2)?,
                timestamp: row.get(3)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Clinic history in insertion order.
    pub fn list_clinic_events(&self) -> StoreResult<Vec<ClinicEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, p_id, sent_at FROM p_clinic ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(ClinicEvent {
                id: row.get(0)?,
                product_id: row.get(1)?,
                timestamp: row.get(2)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Units on hand plus history counts.
    pub fn stock_stats(&self) -> StoreResult<StockStats> {
        let conn = self.lock()?;
        let stats = conn.query_row(
            r#"
            SELECT
                (SELECT COALESCE(SUM(quantity), 0) FROM products),
                (SELECT COUNT(*) FROM p_sold),
                (SELECT COUNT(*) FROM p_clinic)
            "#,
            [],
            |row| {
                Ok(StockStats {
                    total_units_in_stock: row.get(0)?,
                    total_sold_events: row.get(1)?,
                    total_clinic_events: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}
