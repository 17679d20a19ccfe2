// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend selection from configuration.

use std::sync::Arc;

use foodx_config::{StorageBackendKind, StorageConfig};
use foodx_core::{KeyValueStorage, Logger};

use crate::memory::MemoryStorage;
use crate::sqlite::SqliteStorage;

/// Build the storage backend named by `config.backend`. The backend is not
/// initialized yet; its owner calls `initialize` during startup.
pub fn create_storage(config: &StorageConfig, logger: &Logger) -> Arc<dyn KeyValueStorage> {
    match config.backend {
        StorageBackendKind::Persistent => {
            logger.debug(
                &format!("Using persistent storage at {}", config.database_path),
                None,
            );
            Arc::new(SqliteStorage::from_config(config))
        }
        StorageBackendKind::Memory => {
            logger.debug("Using in-memory storage", None);
            Arc::new(MemoryStorage::new())
        }
    }
}
