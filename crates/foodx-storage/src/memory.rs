// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Volatile key-value backend held in process memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use foodx_core::traits::storage::validate_key;
use foodx_core::{Adapter, AdapterType, FoodxError, HealthStatus, KeyValueStorage};

/// In-memory storage. Contents live exactly as long as the instance.
///
/// Each entry remembers when its key was first inserted so that
/// `get_all_keys` reports insertion order; overwriting keeps the original slot.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, (u64, Value)>>,
    next_seq: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Adapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FoodxError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn initialize(&self) -> Result<(), FoodxError> {
        Ok(())
    }

    async fn set_item(&self, key: &str, value: &Value) -> Result<(), FoodxError> {
        validate_key(key)?;
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some((_, stored)) => *stored = value.clone(),
            None => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entries.insert(key.to_string(), (seq, value.clone()));
            }
        }
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<Value>, FoodxError> {
        validate_key(key)?;
        Ok(self.entries.read().await.get(key).map(|(_, v)| v.clone()))
    }

    async fn remove_item(&self, key: &str) -> Result<(), FoodxError> {
        validate_key(key)?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, FoodxError> {
        let entries = self.entries.read().await;
        let mut keyed: Vec<(u64, &String)> =
            entries.iter().map(|(k, (seq, _))| (*seq, k)).collect();
        keyed.sort_unstable_by_key(|(seq, _)| *seq);
        Ok(keyed.into_iter().map(|(_, k)| k.clone()).collect())
    }

    async fn clear(&self) -> Result<(), FoodxError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn stored_values_are_copies() {
        let storage = MemoryStorage::new();
        let mut value = json!({"qty": 1});
        storage.set_item("k", &value).await.unwrap();

        value["qty"] = json!(99);
        let mut read = storage.get_item("k").await.unwrap().unwrap();
        assert_eq!(read["qty"], json!(1));

        read["qty"] = json!(42);
        assert_eq!(storage.get_item("k").await.unwrap().unwrap()["qty"], json!(1));
    }

    #[tokio::test]
    async fn keys_follow_insertion_order() {
        let storage = MemoryStorage::new();
        for key in ["c", "a", "b"] {
            storage.set_item(key, &json!(null)).await.unwrap();
        }
        storage.set_item("c", &json!(1)).await.unwrap();
        storage.remove_item("a").await.unwrap();
        storage.set_item("a", &json!(2)).await.unwrap();
        assert_eq!(storage.get_all_keys().await.unwrap(), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn clear_empties_everything() {
        let storage = MemoryStorage::new();
        storage.set_item("x", &json!(1)).await.unwrap();
        storage.set_item("y", &json!(2)).await.unwrap();
        storage.clear().await.unwrap();
        assert!(storage.is_empty().await);
        assert_eq!(storage.get_item("x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn absent_key_reads_none_and_removes_quietly() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("missing").await.unwrap(), None);
        storage.remove_item("missing").await.unwrap();
        assert_eq!(storage.len().await, 0);
    }
}
