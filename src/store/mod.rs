pub mod disk;
pub mod memory;

use crate::core::Storage;
use crate::core::config::AppConfig;
use disk::DiskStorage;
use memory::MemoryStorage;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens the on-disk store under the configured data path, falling back to
/// an in-memory store when the data directory is unavailable.
pub fn open_storage(config: &AppConfig) -> Arc<dyn Storage> {
    let disk = config
        .default_data_path()
        .map_err(|e| e.to_string())
        .and_then(|path| {
            let db_path = path.join("db");
            debug!("Opening storage at {}", db_path.display());
            DiskStorage::open(&db_path).map_err(|e| e.to_string())
        });

    match disk {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            warn!(error = %e, "Falling back to in-memory storage");
            Arc::new(MemoryStorage::new())
        }
    }
}
