// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent queue of offline operations over a [`KeyValueStorage`].
//!
//! Items live under `<prefix><id>` in the bound storage. Listing is a full
//! scan of the storage's keys, so `get_items` is O(n) in stored entries.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use foodx_core::{FoodxError, KeyValueStorage, Logger};

use crate::filter::QueueItemFilter;
use crate::item::{NewQueuedItem, QueuedItem, QueuedItemStatus, QueuedItemUpdate};

/// Queue manager backed by a key-value storage bound in [`initialize`].
///
/// [`initialize`]: LocalQueueManager::initialize
pub struct LocalQueueManager {
    prefix: String,
    storage: RwLock<Option<Arc<dyn KeyValueStorage>>>,
    logger: Logger,
}

impl LocalQueueManager {
    pub fn new(prefix: impl Into<String>, logger: Logger) -> Self {
        Self {
            prefix: prefix.into(),
            storage: RwLock::new(None),
            logger,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Bind (or rebind) the backing storage.
    pub fn initialize(&self, storage: Arc<dyn KeyValueStorage>) {
        *self
            .storage
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(storage);
        self.logger.debug("Queue manager initialized", None);
    }

    pub fn is_initialized(&self) -> bool {
        self.storage
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn storage(&self) -> Result<Arc<dyn KeyValueStorage>, FoodxError> {
        self.storage
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| FoodxError::not_initialized("queue manager"))
    }

    fn key(&self, id: &str) -> String {
        format!("{}{id}", self.prefix)
    }

    async fn read(
        &self,
        storage: &dyn KeyValueStorage,
        key: &str,
    ) -> Result<Option<QueuedItem>, FoodxError> {
        match storage.get_item(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        storage: &dyn KeyValueStorage,
        item: &QueuedItem,
    ) -> Result<(), FoodxError> {
        storage
            .set_item(&self.key(&item.id), &serde_json::to_value(item)?)
            .await
    }

    /// Persist `item` under a fresh random id and return that id.
    pub async fn add_item(&self, item: NewQueuedItem) -> Result<String, FoodxError> {
        let storage = self.storage()?;

        let id = loop {
            let candidate = uuid::Uuid::new_v4().to_string();
            if storage.get_item(&self.key(&candidate)).await?.is_none() {
                break candidate;
            }
        };

        let item = item.with_id(id.clone());
        if let Err(e) = self.write(storage.as_ref(), &item).await {
            self.logger.error("Failed to add queue item", Some(&e), None);
            return Err(e);
        }

        self.logger.debug(&format!("Added item to queue: {id}"), None);
        Ok(id)
    }

    /// Shallow-merge `update` into the stored item and return the result.
    pub async fn update_item(
        &self,
        id: &str,
        update: QueuedItemUpdate,
    ) -> Result<QueuedItem, FoodxError> {
        let storage = self.storage()?;
        let mut item = self
            .read(storage.as_ref(), &self.key(id))
            .await?
            .ok_or_else(|| FoodxError::ItemNotFound { id: id.to_string() })?;

        update.apply(&mut item);
        self.write(storage.as_ref(), &item).await?;

        self.logger.debug(&format!("Updated queue item: {id}"), None);
        Ok(item)
    }

    pub async fn get_item(&self, id: &str) -> Result<Option<QueuedItem>, FoodxError> {
        let storage = self.storage()?;
        self.read(storage.as_ref(), &self.key(id)).await
    }

    /// Items in this queue's namespace, optionally filtered, sorted and limited.
    pub async fn get_items(
        &self,
        filter: Option<&QueueItemFilter>,
    ) -> Result<Vec<QueuedItem>, FoodxError> {
        let storage = self.storage()?;
        let keys = storage.get_all_keys().await?;

        let mut items = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with(&self.prefix)) {
            // A key can vanish between listing and reading.
            let Some(value) = storage.get_item(key).await? else {
                continue;
            };
            // Cached data may share the namespace; it is not a queued item.
            match serde_json::from_value::<QueuedItem>(value) {
                Ok(item) => items.push(item),
                Err(e) => self.logger.warn(
                    &format!("Skipping non-queue entry {key}: {e}"),
                    None,
                ),
            }
        }

        Ok(match filter {
            Some(filter) => filter.apply(items),
            None => items,
        })
    }

    /// Delete an item. Absent ids are ignored.
    pub async fn remove_item(&self, id: &str) -> Result<(), FoodxError> {
        let storage = self.storage()?;
        storage.remove_item(&self.key(id)).await?;
        self.logger.debug(&format!("Removed item from queue: {id}"), None);
        Ok(())
    }

    /// Delete every item in this queue's namespace and return how many were removed.
    /// Other keys in the same storage are left alone.
    pub async fn clear_all(&self) -> Result<usize, FoodxError> {
        let storage = self.storage()?;
        let keys = storage.get_all_keys().await?;

        let mut removed = 0;
        for key in keys.iter().filter(|k| k.starts_with(&self.prefix)) {
            storage.remove_item(key).await?;
            removed += 1;
        }

        self.logger
            .debug(&format!("Cleared {removed} items from queue"), None);
        Ok(removed)
    }

    /// Number of items per status.
    pub async fn count_by_status(
        &self,
    ) -> Result<HashMap<QueuedItemStatus, usize>, FoodxError> {
        let mut counts = HashMap::new();
        for item in self.get_items(None).await? {
            *counts.entry(item.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
