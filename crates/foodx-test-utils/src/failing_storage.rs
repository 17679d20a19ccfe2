// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage whose reads and writes can be made to fail or stall on demand.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use foodx_core::{Adapter, AdapterType, FoodxError, HealthStatus, KeyValueStorage};
use foodx_storage::MemoryStorage;

/// Wraps [`MemoryStorage`] and injects backend errors while a fault is armed.
///
/// Reads are `get_item` and `get_all_keys`; writes are `set_item`,
/// `remove_item` and `clear`. `initialize` fails only with
/// [`fail_initialize`](FailingStorage::fail_initialize).
#[derive(Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Writes still to fail before writes succeed again.
    failing_writes_left: AtomicUsize,
    write_delay_ms: AtomicU64,
    fail_initialize: AtomicBool,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Fail only the next `count` writes, then recover.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes_left.store(count, Ordering::SeqCst);
    }

    /// Make every write sleep for `delay` (on the Tokio clock) before it lands.
    pub fn delay_writes(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn fail_all(&self, on: bool) {
        self.fail_reads(on);
        self.fail_writes(on);
    }

    pub fn fail_initialize(&self, on: bool) {
        self.fail_initialize.store(on, Ordering::SeqCst);
    }

    /// The wrapped backend, for inspecting state behind the faults.
    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<(), FoodxError> {
        if flag.load(Ordering::SeqCst) {
            return Err(FoodxError::backend(std::io::Error::other(format!(
                "injected {op} failure"
            ))));
        }
        Ok(())
    }

    async fn check_write(&self) -> Result<(), FoodxError> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let one_shot = self
            .failing_writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if one_shot {
            return Err(FoodxError::backend(std::io::Error::other(
                "injected write failure",
            )));
        }
        self.check(&self.fail_writes, "write")
    }
}

#[async_trait]
impl Adapter for FailingStorage {
    fn name(&self) -> &str {
        "failing-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FoodxError> {
        if self.fail_reads.load(Ordering::SeqCst)
            || self.fail_writes.load(Ordering::SeqCst)
            || self.failing_writes_left.load(Ordering::SeqCst) > 0
        {
            return Ok(HealthStatus::Degraded("fault injection armed".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl KeyValueStorage for FailingStorage {
    async fn initialize(&self) -> Result<(), FoodxError> {
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(FoodxError::StorageUnavailable {
                message: "injected initialize failure".into(),
            });
        }
        self.inner.initialize().await
    }

    async fn set_item(&self, key: &str, value: &Value) -> Result<(), FoodxError> {
        self.check_write().await?;
        self.inner.set_item(key, value).await
    }

    async fn get_item(&self, key: &str) -> Result<Option<Value>, FoodxError> {
        self.check(&self.fail_reads, "read")?;
        self.inner.get_item(key).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), FoodxError> {
        self.check_write().await?;
        self.inner.remove_item(key).await
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, FoodxError> {
        self.check(&self.fail_reads, "read")?;
        self.inner.get_all_keys().await
    }

    async fn clear(&self) -> Result<(), FoodxError> {
        self.check_write().await?;
        self.inner.clear().await
    }
}
