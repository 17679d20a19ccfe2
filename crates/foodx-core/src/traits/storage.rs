// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value storage trait implemented by the persistent and volatile backends.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FoodxError;
use crate::traits::adapter::Adapter;

/// A mapping from string keys to JSON values.
///
/// Values cross the trait boundary by value: writes copy the caller's value
/// into the backend and reads hand back an owned copy, so no caller can
/// mutate stored state through a retained reference.
///
/// Backends that share a physical store with other tenants namespace their
/// keys; `get_all_keys` and `clear` only ever see the backend's own namespace.
#[async_trait]
pub trait KeyValueStorage: Adapter {
    /// Acquires backend resources. Fails with
    /// [`FoodxError::StorageUnavailable`] when the backend cannot run here.
    async fn initialize(&self) -> Result<(), FoodxError>;

    /// Inserts or replaces the value stored under `key`.
    async fn set_item(&self, key: &str, value: &Value) -> Result<(), FoodxError>;

    /// Returns the value under `key`, or `None` when absent.
    async fn get_item(&self, key: &str) -> Result<Option<Value>, FoodxError>;

    /// Deletes `key`. Deleting an absent key is a no-op.
    async fn remove_item(&self, key: &str) -> Result<(), FoodxError>;

    /// Lists every key in this backend's namespace, in insertion order.
    async fn get_all_keys(&self) -> Result<Vec<String>, FoodxError>;

    /// Removes every key in this backend's namespace.
    async fn clear(&self) -> Result<(), FoodxError>;
}

/// Rejects keys no backend can address.
pub fn validate_key(key: &str) -> Result<(), FoodxError> {
    if key.is_empty() {
        return Err(FoodxError::InvalidInput("storage key must not be empty".into()));
    }
    Ok(())
}
