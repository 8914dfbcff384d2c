//! Inventory service: the rules for moving stock between the shelf, sales
//! and the clinic.
//!
//! The service validates requests, stamps them with the clock's time and
//! hands the atomic read-check-write to the injected [`StockStore`].

mod error;

pub use error::*;

use std::collections::HashMap;
use std::sync::Arc;

use strsim::{jaro_winkler, normalized_levenshtein};
use tracing::{info, warn};

use crate::clock::{AlbaniaClock, Clock};
use crate::models::{name_key, sort_for_listing, HistoryEntry, HistoryKind, Product, StockStats};
use crate::store::{StockStore, StoreError, WithdrawOutcome, Withdrawal};

/// Minimum similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Stock operations over an injected store and clock.
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn StockStore>,
    clock: Arc<dyn Clock>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn StockStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Service stamping history with Albania time.
    pub fn with_albania_clock(store: Arc<dyn StockStore>) -> Self {
        Self::new(store, Arc::new(AlbaniaClock))
    }

    /// Register incoming stock. Creates the product on first sight of its name.
    pub fn add_stock(&self, name: &str, quantity: i64) -> InventoryResult<Product> {
        let name = validate_name(name)?;
        validate_quantity(quantity)?;

        let product = self.store.restock(name, quantity).map_err(|e| match e {
            StoreError::Overflow(name) => {
                InventoryError::InvalidArgument(format!("quantity too large for {}", name))
            }
            other => InventoryError::Backend(other),
        })?;

        info!(product = %product.name, added = quantity, on_hand = product.quantity, "Stock added");
        Ok(product)
    }

    /// Sell `quantity` units. Rejected whole if stock is short.
    pub fn sell_stock(&self, name: &str, quantity: i64) -> InventoryResult<Product> {
        let name = validate_name(name)?;
        validate_quantity(quantity)?;

        // One timestamp for the whole sale.
        let timestamp = self.clock.timestamp();
        match self.store.withdraw(&Withdrawal::sale(name, quantity, &timestamp))? {
            WithdrawOutcome::Completed(product) => {
                info!(product = %product.name, sold = quantity, on_hand = product.quantity, "Stock sold");
                Ok(product)
            }
            WithdrawOutcome::NotFound => Err(self.not_found(name)),
            WithdrawOutcome::Insufficient { available } => Err(InventoryError::InsufficientStock {
                name: name.to_string(),
                requested: quantity,
                available,
            }),
        }
    }

    /// Send a single unit to the clinic.
    pub fn dispense_to_clinic(&self, name: &str) -> InventoryResult<Product> {
        let name = validate_name(name)?;

        let timestamp = self.clock.timestamp();
        match self.store.withdraw(&Withdrawal::clinic(name, &timestamp))? {
            WithdrawOutcome::Completed(product) => {
                info!(product = %product.name, on_hand = product.quantity, "Unit sent to clinic");
                Ok(product)
            }
            WithdrawOutcome::NotFound => Err(self.not_found(name)),
            WithdrawOutcome::Insufficient { .. } => Err(InventoryError::OutOfStock(name.to_string())),
        }
    }

    /// Products in stock whose name contains `query`, ignoring case.
    /// An empty query lists every product in stock.
    pub fn search(&self, query: &str) -> InventoryResult<Vec<Product>> {
        let needle = name_key(query);
        let mut products: Vec<Product> = self
            .store
            .products()?
            .into_iter()
            .filter(|p| p.is_active() && p.key().contains(&needle))
            .collect();
        sort_for_listing(&mut products);
        Ok(products)
    }

    /// Every product with stock on hand, by name.
    pub fn list_products(&self) -> InventoryResult<Vec<Product>> {
        self.search("")
    }

    pub fn get_stats(&self) -> InventoryResult<StockStats> {
        Ok(self.store.stats()?)
    }

    /// History, most recent first. Same-second entries keep reverse insertion order.
    pub fn list_history(&self, kind: HistoryKind) -> InventoryResult<Vec<HistoryEntry>> {
        let names: HashMap<i64, String> = self
            .store
            .products()?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let name_of = |product_id: i64| {
            names
                .get(&product_id)
                .cloned()
                .unwrap_or_else(|| format!("#{}", product_id))
        };

        let mut rows: Vec<(i64, HistoryEntry)> = match kind {
            HistoryKind::Sold => self
                .store
                .sold_events()?
                .into_iter()
                .map(|e| {
                    let entry = HistoryEntry {
                        name: name_of(e.product_id),
                        quantity: Some(e.quantity),
                        timestamp: e.timestamp,
                    };
                    (e.id, entry)
                })
                .collect(),
            HistoryKind::Clinic => self
                .store
                .clinic_events()?
                .into_iter()
                .map(|e| {
                    let entry = HistoryEntry {
                        name: name_of(e.product_id),
                        quantity: None,
                        timestamp: e.timestamp,
                    };
                    (e.id, entry)
                })
                .collect(),
        };

        rows.sort_by(|(a_id, a), (b_id, b)| b.timestamp.cmp(&a.timestamp).then(b_id.cmp(a_id)));
        Ok(rows.into_iter().map(|(_, entry)| entry).collect())
    }

    fn not_found(&self, name: &str) -> InventoryError {
        let suggestion = match self.store.products() {
            Ok(products) => closest_name(name, products.iter().map(|p| p.name.as_str())),
            Err(e) => {
                warn!(error = %e, "Could not load products for suggestion");
                None
            }
        };
        InventoryError::NotFound {
            name: name.to_string(),
            suggestion,
        }
    }
}

fn validate_name(name: &str) -> InventoryResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InventoryError::InvalidArgument(
            "product name must not be empty".into(),
        ));
    }
    Ok(trimmed)
}

fn validate_quantity(quantity: i64) -> InventoryResult<()> {
    if quantity <= 0 {
        return Err(InventoryError::InvalidArgument(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(())
}

/// Best fuzzy match for `name` among `candidates`, above the suggestion threshold.
fn closest_name<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    let key = name_key(name);
    candidates
        .map(|candidate| (candidate, fuzzy_match(&key, &name_key(candidate))))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(candidate, _)| candidate.to_string())
}

/// Combined Jaro-Winkler / Levenshtein similarity.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::Database;
    use crate::models::{ClinicEvent, SoldEvent};
    use crate::store::StoreResult;

    fn setup_service() -> InventoryService {
        let store = Arc::new(Database::open_in_memory().unwrap());
        let clock = Arc::new(FixedClock::at("2025-06-01 12:00:00").unwrap());
        InventoryService::new(store, clock)
    }

    /// Store whose every call fails, standing in for an unreachable backend.
    struct UnreachableStore;

    fn unreachable<T>() -> StoreResult<T> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "backend offline",
        )))
    }

    impl StockStore for UnreachableStore {
        fn restock(&self, _name: &str, _quantity: i64) -> StoreResult<Product> {
            unreachable()
        }
        fn withdraw(&self, _withdrawal: &Withdrawal<'_>) -> StoreResult<WithdrawOutcome> {
            unreachable()
        }
        fn products(&self) -> StoreResult<Vec<Product>> {
            unreachable()
        }
        fn sold_events(&self) -> StoreResult<Vec<SoldEvent>> {
            unreachable()
        }
        fn clinic_events(&self) -> StoreResult<Vec<ClinicEvent>> {
            unreachable()
        }
        fn stats(&self) -> StoreResult<StockStats> {
            unreachable()
        }
    }

    #[test]
    fn test_add_rejects_blank_name() {
        let service = setup_service();
        let result = service.add_stock("   ", 5);
        assert!(matches!(result, Err(InventoryError::InvalidArgument(_))));
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let service = setup_service();
        assert!(matches!(
            service.add_stock("Aspirin", 0),
            Err(InventoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.add_stock("Aspirin", -3),
            Err(InventoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_add_trims_name() {
        let service = setup_service();
        let product = service.add_stock("  Aspirin  ", 5).unwrap();
        assert_eq!(product.name, "Aspirin");
    }

    #[test]
    fn test_add_overflow_is_invalid_argument() {
        let service = setup_service();
        service.add_stock("Saline", i64::MAX).unwrap();
        assert!(matches!(
            service.add_stock("Saline", 1),
            Err(InventoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sell_uses_clock_timestamp() {
        let service = setup_service();
        service.add_stock("Aspirin", 5).unwrap();
        service.sell_stock("aspirin", 2).unwrap();

        let history = service.list_history(HistoryKind::Sold).unwrap();
        assert_eq!(
            history,
            vec![HistoryEntry {
                name: "Aspirin".into(),
                quantity: Some(2),
                timestamp: "2025-06-01 12:00:00".into(),
            }]
        );
    }

    #[test]
    fn test_sell_insufficient() {
        let service = setup_service();
        service.add_stock("Aspirin", 1).unwrap();

        match service.sell_stock("Aspirin", 2) {
            Err(InventoryError::InsufficientStock {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_sell_unknown_suggests_close_name() {
        let service = setup_service();
        service.add_stock("Amoxicillin", 5).unwrap();

        match service.sell_stock("amoxicilin", 1) {
            Err(InventoryError::NotFound { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("Amoxicillin"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_without_similar_name() {
        let service = setup_service();
        service.add_stock("Amoxicillin", 5).unwrap();

        match service.dispense_to_clinic("Gauze") {
            Err(InventoryError::NotFound { suggestion, .. }) => assert!(suggestion.is_none()),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_dispense_out_of_stock() {
        let service = setup_service();
        service.add_stock("Gauze", 1).unwrap();
        service.dispense_to_clinic("gauze").unwrap();

        assert!(matches!(
            service.dispense_to_clinic("Gauze"),
            Err(InventoryError::OutOfStock(_))
        ));
        assert_eq!(service.get_stats().unwrap().total_clinic_events, 1);
    }

    #[test]
    fn test_search_filters_and_sorts() {
        let service = setup_service();
        service.add_stock("Ibuprofen 400", 3).unwrap();
        service.add_stock("aspirin", 3).unwrap();
        service.add_stock("Ibuprofen 200", 1).unwrap();
        service.sell_stock("Ibuprofen 200", 1).unwrap();

        let names: Vec<_> = service
            .search("IBU")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Ibuprofen 400"]);

        let all: Vec<_> = service
            .search("")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(all, vec!["aspirin", "Ibuprofen 400"]);
        assert_eq!(service.list_products().unwrap().len(), 2);
        assert!(service.search("xyz-no-match").unwrap().is_empty());
    }

    #[test]
    fn test_history_most_recent_first() {
        let store: Arc<dyn StockStore> = Arc::new(Database::open_in_memory().unwrap());
        let early = InventoryService::new(
            store.clone(),
            Arc::new(FixedClock::at("2025-06-01 08:00:00").unwrap()),
        );
        let late = InventoryService::new(
            store,
            Arc::new(FixedClock::at("2025-06-01 09:00:00").unwrap()),
        );

        early.add_stock("Aspirin", 10).unwrap();
        early.add_stock("Gauze", 10).unwrap();
        late.dispense_to_clinic("Aspirin").unwrap();
        early.dispense_to_clinic("Gauze").unwrap();
        late.dispense_to_clinic("Gauze").unwrap();

        let history = early.list_history(HistoryKind::Clinic).unwrap();
        let rows: Vec<_> = history
            .iter()
            .map(|e| (e.name.as_str(), e.timestamp.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Gauze", "2025-06-01 09:00:00"),
                ("Aspirin", "2025-06-01 09:00:00"),
                ("Gauze", "2025-06-01 08:00:00"),
            ]
        );
        assert!(history.iter().all(|e| e.quantity.is_none()));
    }

    #[test]
    fn test_backend_errors_surface() {
        let service = InventoryService::new(
            Arc::new(UnreachableStore),
            Arc::new(FixedClock::at("2025-06-01 12:00:00").unwrap()),
        );

        assert!(matches!(
            service.add_stock("Aspirin", 1),
            Err(InventoryError::Backend(_))
        ));
        assert!(matches!(
            service.sell_stock("Aspirin", 1),
            Err(InventoryError::Backend(_))
        ));
        assert!(matches!(
            service.dispense_to_clinic("Aspirin"),
            Err(InventoryError::Backend(_))
        ));
        assert!(matches!(service.search(""), Err(InventoryError::Backend(_))));
        assert!(matches!(service.get_stats(), Err(InventoryError::Backend(_))));
        assert!(matches!(
            service.list_history(HistoryKind::Sold),
            Err(InventoryError::Backend(_))
        ));
    }

    #[test]
    fn test_validation_precedes_backend() {
        let service = InventoryService::new(
            Arc::new(UnreachableStore),
            Arc::new(FixedClock::at("2025-06-01 12:00:00").unwrap()),
        );
        assert!(matches!(
            service.sell_stock("", 1),
            Err(InventoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fuzzy_match_identity() {
        assert!((fuzzy_match("aspirin", "aspirin") - 1.0).abs() < f64::EPSILON);
        assert!(fuzzy_match("aspirin", "gauze") < SUGGESTION_THRESHOLD);
    }
}
