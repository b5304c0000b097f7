pub mod manager;
pub mod memory;
pub mod models;
pub mod mysql;
pub mod store;

use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, StorageBackend};

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use mysql::MySqlStore;
pub use store::{FileStore, PropertyStore, Store, UserStore, ZoningStore};

/// Build the configured store, running migrations first when enabled
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>, DatabaseError> {
    match config.database.backend {
        StorageBackend::MySql => {
            let pool = DatabaseManager::connect(&config.database).await?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }
            Ok(Arc::new(MySqlStore::new(pool)))
        }
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
