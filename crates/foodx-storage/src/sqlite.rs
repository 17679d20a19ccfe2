// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent key-value backend over a shared SQLite file.
//!
//! Every key this backend writes is stored as `{prefix}{key}`. Rows written
//! under other prefixes are invisible to [`KeyValueStorage::get_all_keys`]
//! and untouched by [`KeyValueStorage::clear`].

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use foodx_config::StorageConfig;
use foodx_core::traits::storage::validate_key;
use foodx_core::{Adapter, AdapterType, FoodxError, HealthStatus, KeyValueStorage};

use crate::database::{Database, map_tr_err};

/// SQLite-backed, namespaced key-value storage.
///
/// The database is opened lazily by [`KeyValueStorage::initialize`]; calling
/// it again is a no-op.
pub struct SqliteStorage {
    path: String,
    prefix: String,
    wal_mode: bool,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(path: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prefix: prefix.into(),
            wal_mode: true,
            db: OnceCell::new(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            wal_mode: config.wal_mode,
            ..Self::new(config.database_path.clone(), config.key_prefix.clone())
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn db(&self) -> Result<&Database, FoodxError> {
        self.db
            .get()
            .ok_or_else(|| FoodxError::not_initialized("sqlite storage"))
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl Adapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FoodxError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl KeyValueStorage for SqliteStorage {
    async fn initialize(&self) -> Result<(), FoodxError> {
        let path = self.path.clone();
        let wal_mode = self.wal_mode;
        self.db
            .get_or_try_init(|| async move {
                Database::open(&path, wal_mode)
                    .await
                    .map_err(|e| FoodxError::StorageUnavailable {
                        message: format!("cannot open {path}: {e}"),
                    })
            })
            .await?;
        debug!(path = %self.path, prefix = %self.prefix, "SQLite storage initialized");
        Ok(())
    }

    async fn set_item(&self, key: &str, value: &Value) -> Result<(), FoodxError> {
        validate_key(key)?;
        let db = self.db()?;
        let key = self.full_key(key);
        let value = serde_json::to_string(value)?;
        db.connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn get_item(&self, key: &str) -> Result<Option<Value>, FoodxError> {
        validate_key(key)?;
        let db = self.db()?;
        let key = self.full_key(key);
        let raw = db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;

        raw.map(|text| serde_json::from_str(&text))
            .transpose()
            .map_err(FoodxError::from)
    }

    async fn remove_item(&self, key: &str) -> Result<(), FoodxError> {
        validate_key(key)?;
        let db = self.db()?;
        let key = self.full_key(key);
        db.connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, FoodxError> {
        let db = self.db()?;
        let prefix = self.prefix.clone();
        let keys = db
            .connection()
            .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT key FROM kv_store
                     WHERE substr(key, 1, length(?1)) = ?1
                     ORDER BY rowid ASC",
                )?;
                let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)?;

        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(self.prefix.as_str()).map(str::to_string))
            .collect())
    }

    async fn clear(&self) -> Result<(), FoodxError> {
        let db = self.db()?;
        let prefix = self.prefix.clone();
        let removed = db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM kv_store WHERE substr(key, 1, length(?1)) = ?1",
                    params![prefix],
                )
            })
            .await
            .map_err(map_tr_err)?;
        debug!(removed, prefix = %self.prefix, "cleared namespace");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    async fn open(path: &std::path::Path, prefix: &str) -> SqliteStorage {
        let storage = SqliteStorage::new(path.to_str().unwrap(), prefix);
        storage.initialize().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn adapter_identity() {
        let storage = SqliteStorage::new(":memory:", "foodx:");
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let storage = SqliteStorage::new(":memory:", "foodx:");
        let err = storage.get_item("a").await.unwrap_err();
        assert!(matches!(err, FoodxError::NotInitialized { .. }));
        assert!(storage.health_check().await.is_err());
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let storage = SqliteStorage::new(":memory:", "foodx:");
        storage.initialize().await.unwrap();
        storage.set_item("a", &json!(1)).await.unwrap();
        storage.initialize().await.unwrap();
        assert_eq!(storage.get_item("a").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn unopenable_path_is_unavailable() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let storage = SqliteStorage::new(blocker.join("db.sqlite").to_str().unwrap(), "foodx:");
        let err = storage.initialize().await.unwrap_err();
        assert!(matches!(err, FoodxError::StorageUnavailable { .. }));
    }

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let storage = SqliteStorage::new(":memory:", "foodx:");
        storage.initialize().await.unwrap();

        let value = json!({"name": "apple", "qty": 3, "tags": ["fresh"]});
        storage.set_item("k", &value).await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap(), Some(value));

        storage.set_item("k", &json!("replaced")).await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap(), Some(json!("replaced")));

        storage.remove_item("k").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap(), None);
        storage.remove_item("k").await.unwrap();
    }

    #[tokio::test]
    async fn keys_are_unprefixed_and_in_insertion_order() {
        let storage = SqliteStorage::new(":memory:", "foodx:");
        storage.initialize().await.unwrap();
        for key in ["zeta", "alpha", "mid"] {
            storage.set_item(key, &json!(key)).await.unwrap();
        }
        storage.set_item("zeta", &json!("again")).await.unwrap();
        assert_eq!(
            storage.get_all_keys().await.unwrap(),
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[tokio::test]
    async fn namespaces_do_not_leak_across_prefixes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let ours = open(&path, "foodx:").await;
        let theirs = open(&path, "other:").await;

        ours.set_item("a", &json!(1)).await.unwrap();
        theirs.set_item("b", &json!(2)).await.unwrap();

        assert_eq!(ours.get_all_keys().await.unwrap(), vec!["a"]);
        assert_eq!(ours.get_item("b").await.unwrap(), None);

        ours.clear().await.unwrap();
        assert!(ours.get_all_keys().await.unwrap().is_empty());
        assert_eq!(theirs.get_item("b").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("durable.db");
        {
            let storage = open(&path, "foodx:").await;
            storage.set_item("kept", &json!({"v": 1})).await.unwrap();
        }
        let storage = open(&path, "foodx:").await;
        assert_eq!(storage.get_item("kept").await.unwrap(), Some(json!({"v": 1})));
    }

    #[tokio::test]
    async fn sqlite_faults_surface_as_backend_errors() {
        let storage = SqliteStorage::new(":memory:", "foodx:");
        storage.initialize().await.unwrap();
        storage
            .db()
            .unwrap()
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("DROP TABLE kv_store;")
            })
            .await
            .unwrap();

        let err = storage.set_item("a", &json!(1)).await.unwrap_err();
        assert!(matches!(err, FoodxError::Backend { .. }), "{err:?}");
        let err = storage.get_item("a").await.unwrap_err();
        assert!(matches!(err, FoodxError::Backend { .. }), "{err:?}");
        let err = storage.get_all_keys().await.unwrap_err();
        assert!(matches!(err, FoodxError::Backend { .. }), "{err:?}");
        let err = storage.remove_item("a").await.unwrap_err();
        assert!(matches!(err, FoodxError::Backend { .. }), "{err:?}");
        assert!(storage.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let storage = SqliteStorage::new(":memory:", "foodx:");
        storage.initialize().await.unwrap();
        let err = storage.set_item("", &json!(1)).await.unwrap_err();
        assert!(matches!(err, FoodxError::InvalidInput(_)));
    }
}
