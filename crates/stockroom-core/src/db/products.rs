//! Product database operations.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::Database;
use crate::models::{name_key, Product};
use crate::store::{StoreError, StoreResult};

impl Database {
    /// Add units to a product, inserting it on first registration.
    pub fn restock_product(&self, name: &str, quantity: i64) -> StoreResult<Product> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let key = name_key(name);

        // Keep the ledger-wide total representable so SUM() in stats cannot overflow.
        let total: i64 = tx.query_row("SELECT COALESCE(SUM(quantity), 0) FROM products", [], |row| {
            row.get(0)
        })?;
        total
            .checked_add(quantity)
            .ok_or_else(|| StoreError::Overflow(name.to_string()))?;

        let product = match find_by_key(&tx, &key)? {
            Some(mut product) => {
                product.quantity = product
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| StoreError::Overflow(product.name.clone()))?;
                tx.execute(
                    "UPDATE products SET quantity = ?2 WHERE id = ?1",
                    params![product.id, product.quantity],
                )?;
                product
            }
            None => {
                tx.execute(
                    "INSERT INTO products (name, name_key, quantity) VALUES (?1, ?2, ?3)",
                    params![name, key, quantity],
                )?;
                Product {
                    id: tx.last_insert_rowid(),
                    name: name.to_string(),
                    quantity,
                }
            }
        };

        tx.commit()?;
        Ok(product)
    }

    /// Get a product by name, ignoring case.
    #[cfg(test)]
    pub(crate) fn find_product(&self, name: &str) -> StoreResult<Option<Product>> {
        let conn = self.lock()?;
        Ok(find_by_key(&conn, &name_key(name))?)
    }

    /// All products ordered by name.
    pub fn list_products(&self) -> StoreResult<Vec<Product>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, quantity
            FROM products
            ORDER BY name_key, id
            "#,
        )?;

        let rows = stmt.query_map([], product_from_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }
}

/// Look up a product by its normalized name within an open connection or transaction.
pub(super) fn find_by_key(conn: &Connection, key: &str) -> rusqlite::Result<Option<Product>> {
    conn.query_row(
        "SELECT id, name, quantity FROM products WHERE name_key = ?",
        [key],
        product_from_row,
    )
    .optional()
}

fn product_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
    })
}
