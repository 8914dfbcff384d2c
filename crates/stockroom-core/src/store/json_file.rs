//! Single-document JSON backend.
//!
//! The whole ledger lives in one file shaped as
//! `{"products": [], "sold_products": [], "clinic_products": []}`. Every
//! mutation rewrites the document through a temp file and an atomic rename,
//! so readers never observe a half-applied withdrawal. Writers are serialized
//! by an in-process mutex only; point several processes at one file and
//! they will lose updates.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{Destination, StockStore, StoreError, StoreResult, WithdrawOutcome, Withdrawal};
use crate::models::{name_key, ClinicEvent, Product, SoldEvent, StockStats};

/// JSON-file-backed store.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    #[cfg(test)]
    fail_saves: AtomicBool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    products: Vec<ProductRecord>,
    #[serde(default)]
    sold_products: Vec<SoldRecord>,
    #[serde(default)]
    clinic_products: Vec<ClinicRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductRecord {
    #[serde(default)]
    id: i64,
    name: String,
    quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SoldRecord {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    product_id: i64,
    name: String,
    quantity: i64,
    date_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClinicRecord {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    product_id: i64,
    name: String,
    date_time: String,
}

impl From<&ProductRecord> for Product {
    fn from(record: &ProductRecord) -> Self {
        Product {
            id: record.id,
            name: record.name.clone(),
            quantity: record.quantity,
        }
    }
}

impl JsonFileStore {
    /// Use the document at `path`. The file is created on the first write.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
            #[cfg(test)]
            fail_saves: AtomicBool::new(false),
        };
        // Surface unreadable or malformed documents at startup.
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<Document> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::default()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Document::default());
        }

        let mut doc: Document = serde_json::from_str(&raw)?;
        doc.backfill_ids();
        Ok(doc)
    }

    fn save(&self, doc: &Document) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, doc)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        #[cfg(test)]
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(io::Error::other("injected save failure").into());
        }
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// The lock guards no data of its own and the document on disk is only
    /// ever replaced whole, so a holder that panicked leaves nothing to repair.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a read-modify-write cycle under the write lock. The document is
    /// only persisted when `f` reports a change.
    fn update<T>(&self, f: impl FnOnce(&mut Document) -> StoreResult<(T, bool)>) -> StoreResult<T> {
        let _guard = self.lock();
        let mut doc = self.load()?;
        let (value, changed) = f(&mut doc)?;
        if changed {
            self.save(&doc)?;
        }
        Ok(value)
    }

    fn read<T>(&self, f: impl FnOnce(&Document) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self.lock();
        let doc = self.load()?;
        f(&doc)
    }
}

impl Document {
    fn find_index(&self, key: &str) -> Option<usize> {
        self.products.iter().position(|p| name_key(&p.name) == key)
    }

    /// Units on hand across every product, `None` if the sum leaves `i64`.
    fn total_units(&self) -> Option<i64> {
        self.products
            .iter()
            .try_fold(0i64, |total, p| total.checked_add(p.quantity))
    }

    fn next_product_id(&self) -> i64 {
        self.products.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    /// Give legacy records (written before ids existed) stable ids and
    /// resolve their product references by name.
    fn backfill_ids(&mut self) {
        let mut next_id = self.next_product_id();
        for product in self.products.iter_mut().filter(|p| p.id == 0) {
            product.id = next_id;
            next_id += 1;
        }

        let mut next_sold = self.sold_products.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        for i in 0..self.sold_products.len() {
            if self.sold_products[i].product_id == 0 {
                let name = self.sold_products[i].name.clone();
                self.sold_products[i].product_id = self.product_id_for(&name);
            }
            if self.sold_products[i].id == 0 {
                self.sold_products[i].id = next_sold;
                next_sold += 1;
            }
        }

        let mut next_clinic = self.clinic_products.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        for i in 0..self.clinic_products.len() {
            if self.clinic_products[i].product_id == 0 {
                let name = self.clinic_products[i].name.clone();
                self.clinic_products[i].product_id = self.product_id_for(&name);
            }
            if self.clinic_products[i].id == 0 {
                self.clinic_products[i].id = next_clinic;
                next_clinic += 1;
            }
        }
    }

    /// Id of the product named `name`, registering an empty one if history
    /// refers to a product the document no longer lists.
    fn product_id_for(&mut self, name: &str) -> i64 {
        if let Some(index) = self.find_index(&name_key(name)) {
            return self.products[index].id;
        }
        let id = self.next_product_id();
        self.products.push(ProductRecord {
            id,
            name: name.trim().to_string(),
            quantity: 0,
        });
        id
    }
}

impl StockStore for JsonFileStore {
    fn restock(&self, name: &str, quantity: i64) -> StoreResult<Product> {
        self.update(|doc| {
            // Keep the ledger-wide total representable so stats never overflow.
            doc.total_units()
                .and_then(|total| total.checked_add(quantity))
                .ok_or_else(|| StoreError::Overflow(name.to_string()))?;

            let product = match doc.find_index(&name_key(name)) {
                Some(index) => {
                    let record = &mut doc.products[index];
                    record.quantity = record
                        .quantity
                        .checked_add(quantity)
                        .ok_or_else(|| StoreError::Overflow(record.name.clone()))?;
                    Product::from(&*record)
                }
                None => {
                    let record = ProductRecord {
                        id: doc.next_product_id(),
                        name: name.to_string(),
                        quantity,
                    };
                    let product = Product::from(&record);
                    doc.products.push(record);
                    product
                }
            };
            Ok((product, true))
        })
    }

    fn withdraw(&self, withdrawal: &Withdrawal<'_>) -> StoreResult<WithdrawOutcome> {
        self.update(|doc| {
            let Some(index) = doc.find_index(&name_key(withdrawal.name)) else {
                return Ok((WithdrawOutcome::NotFound, false));
            };
            let available = doc.products[index].quantity;
            if available < withdrawal.quantity {
                return Ok((WithdrawOutcome::Insufficient { available }, false));
            }

            doc.products[index].quantity = available
                .checked_sub(withdrawal.quantity)
                .ok_or_else(|| StoreError::Overflow(withdrawal.name.to_string()))?;
            let product = Product::from(&doc.products[index]);

            match withdrawal.destination {
                Destination::Sold => {
                    let id = doc.sold_products.iter().map(|r| r.id).max().unwrap_or(0) + 1;
                    doc.sold_products.push(SoldRecord {
                        id,
                        product_id: product.id,
                        name: product.name.clone(),
                        quantity: withdrawal.quantity,
                        date_time: withdrawal.timestamp.to_string(),
                    });
                }
                Destination::Clinic => {
                    let id = doc.clinic_products.iter().map(|r| r.id).max().unwrap_or(0) + 1;
                    doc.clinic_products.push(ClinicRecord {
                        id,
                        product_id: product.id,
                        name: product.name.clone(),
                        date_time: withdrawal.timestamp.to_string(),
                    });
                }
            }

            Ok((WithdrawOutcome::Completed(product), true))
        })
    }

    fn products(&self) -> StoreResult<Vec<Product>> {
        self.read(|doc| Ok(doc.products.iter().map(Product::from).collect()))
    }

    fn sold_events(&self) -> StoreResult<Vec<SoldEvent>> {
        self.read(|doc| {
            Ok(doc
                .sold_products
                .iter()
                .map(|r| SoldEvent {
                    id: r.id,
                    product_id: r.product_id,
                    quantity: r.quantity,
                    timestamp: r.date_time.clone(),
                })
                .collect())
        })
    }

    fn clinic_events(&self) -> StoreResult<Vec<ClinicEvent>> {
        self.read(|doc| {
            Ok(doc
                .clinic_products
                .iter()
                .map(|r| ClinicEvent {
                    id: r.id,
                    product_id: r.product_id,
                    timestamp: r.date_time.clone(),
                })
                .collect())
        })
    }

    fn stats(&self) -> StoreResult<StockStats> {
        self.read(|doc| {
            let total_units_in_stock = doc
                .total_units()
                .ok_or_else(|| StoreError::Overflow("stock total".into()))?;
            Ok(StockStats {
                total_units_in_stock,
                total_sold_events: doc.sold_products.len() as i64,
                total_clinic_events: doc.clinic_products.len() as i64,
            })
        })
    }
}
