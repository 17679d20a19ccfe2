// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for offline service integration tests.
//!
//! `TestHarness` assembles an [`OfflineService`] over a [`FailingStorage`]
//! with a [`ManualClock`] and a [`RecordingListener`] subscribed to every
//! event kind.

use std::sync::Arc;

use foodx_config::OfflineConfig;
use foodx_core::{FoodxError, LogLevel, Logger};
use foodx_offline::{EventListener, OfflineEventKind, OfflineService, QueuedOperation};

use crate::clock::ManualClock;
use crate::failing_storage::FailingStorage;
use crate::listeners::RecordingListener;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: Option<OfflineConfig>,
    start_time: Option<i64>,
    initialize: bool,
    early_listeners: Vec<(OfflineEventKind, Arc<dyn EventListener>)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: Some(OfflineConfig::enabled()),
            start_time: None,
            initialize: true,
            early_listeners: Vec::new(),
        }
    }

    /// Offline configuration passed to `initialize`. Enabled without a timer by default.
    pub fn with_config(mut self, config: OfflineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Initialize with no configuration at all.
    pub fn without_config(mut self) -> Self {
        self.config = None;
        self
    }

    pub fn with_start_time(mut self, millis: i64) -> Self {
        self.start_time = Some(millis);
        self
    }

    /// Register `listener` ahead of the harness's own recorder.
    pub fn with_listener(mut self, kind: OfflineEventKind, listener: Arc<dyn EventListener>) -> Self {
        self.early_listeners.push((kind, listener));
        self
    }

    /// Leave the service uninitialized.
    pub fn uninitialized(mut self) -> Self {
        self.initialize = false;
        self
    }

    pub async fn build(self) -> Result<TestHarness, FoodxError> {
        let clock = Arc::new(match self.start_time {
            Some(start) => ManualClock::new(start),
            None => ManualClock::default(),
        });
        let storage = Arc::new(FailingStorage::new());
        let service = OfflineService::builder(storage.clone())
            .clock(clock.clone())
            .logger(Logger::new("TestHarness.OfflineService", LogLevel::Debug))
            .build();

        for (kind, listener) in self.early_listeners {
            service.on(kind, listener);
        }

        let events = Arc::new(RecordingListener::new());
        for kind in [
            OfflineEventKind::Online,
            OfflineEventKind::Offline,
            OfflineEventKind::Sync,
        ] {
            service.on(kind, events.clone());
        }

        if self.initialize {
            service.initialize(self.config).await?;
        }

        Ok(TestHarness {
            service,
            storage,
            clock,
            events,
        })
    }
}

/// An offline service with deterministic time, injectable storage faults
/// and captured events.
pub struct TestHarness {
    pub service: OfflineService,
    pub storage: Arc<FailingStorage>,
    pub clock: Arc<ManualClock>,
    /// Subscribed to every event kind.
    pub events: Arc<RecordingListener>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Queue one operation per resource type and return the ids in order.
    pub async fn queue_many(&self, resource_types: &[&str]) -> Result<Vec<String>, FoodxError> {
        let mut ids = Vec::with_capacity(resource_types.len());
        for (n, resource_type) in resource_types.iter().enumerate() {
            let op = QueuedOperation::new("create", *resource_type, serde_json::json!({"n": n}));
            ids.push(self.service.queue_operation(op).await?);
        }
        Ok(ids)
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.service.dispose();
    }
}
