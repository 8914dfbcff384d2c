use std::sync::Arc;

use stockroom_core::{Database, InventoryService, JsonFileStore, StockStore, StoreResult};
use tracing::info;

use crate::config::{Backend, Config};
use crate::views::Views;

pub struct State {
    pub inventory: InventoryService,
    pub views: Views,
}

impl State {
    pub fn new(inventory: InventoryService) -> Result<Arc<Self>, tera::Error> {
        Ok(Arc::new(Self {
            inventory,
            views: Views::new()?,
        }))
    }
}

/// Open the backend the configuration asks for.
pub fn open_store(config: &Config) -> StoreResult<Arc<dyn StockStore>> {
    let store: Arc<dyn StockStore> = match config.backend {
        Backend::Sqlite => {
            info!(path = %config.db_path.display(), "Opening SQLite store");
            Arc::new(Database::open(&config.db_path)?)
        }
        Backend::Json => {
            let store = JsonFileStore::open(&config.data_file)?;
            info!(path = %store.path().display(), "Opened JSON file store");
            Arc::new(store)
        }
    };
    Ok(store)
}
