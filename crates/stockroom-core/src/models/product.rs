//! Product models.

use serde::{Deserialize, Serialize};

/// A stocked product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Backend-assigned identifier
    pub id: i64,
    /// Display name, cased as first registered
    pub name: String,
    /// On-hand quantity, never negative
    pub quantity: i64,
}

impl Product {
    /// Products with stock on hand; depleted ones are hidden from listings.
    pub fn is_active(&self) -> bool {
        self.quantity > 0
    }

    /// Case-insensitive lookup key for this product.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

/// Normalize a product name for case-insensitive matching.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Order products the way listings present them: by name, then by id.
pub fn sort_for_listing(products: &mut [Product]) {
    products.sort_by(|a, b| a.key().cmp(&b.key()).then(a.id.cmp(&b.id)));
}
