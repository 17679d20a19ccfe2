// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The offline service: connectivity tracking, the operation queue, the
//! cached-data envelope and the synchronization pass.
//!
//! Three triggers start a pass without a caller waiting on it: the periodic
//! timer, queueing an operation while online, and coming back online. Their
//! failures are logged and never surface anywhere else. Passes themselves are
//! serialized: a pass that starts while another is running waits for it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use foodx_config::OfflineConfig;
use foodx_core::{Clock, FoodxError, KeyValueStorage, Logger, SystemClock, Timestamp};

use crate::events::{EventListener, ListenerRegistry, OfflineEvent, OfflineEventKind};
use crate::filter::QueueItemFilter;
use crate::item::{NewQueuedItem, QueuedItem, QueuedItemStatus, QueuedItemUpdate, QueuedOperation};
use crate::queue::LocalQueueManager;
use crate::sync::{ConflictResolver, Connectivity, SyncOptions, SyncResult, SyncState};

/// Default namespace for queued items.
pub const DEFAULT_QUEUE_PREFIX: &str = "queue:";

/// Options attached to a cached value by [`OfflineService::store_data`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOptions {
    /// Lifetime in milliseconds, checked lazily on read. Zero never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Anything else the caller wants carried along.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoreOptions {
    pub fn expires_in(millis: u64) -> Self {
        Self {
            expires_in: Some(millis),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedEntry {
    data: Value,
    metadata: CacheMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheMetadata {
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<StoreOptions>,
}

impl CachedEntry {
    fn is_expired(&self, now: Timestamp) -> bool {
        let expires_in = self
            .metadata
            .options
            .as_ref()
            .and_then(|o| o.expires_in)
            .filter(|ms| *ms > 0);
        match expires_in {
            Some(ms) => now > self.metadata.timestamp.saturating_add(ms as i64),
            None => false,
        }
    }
}

/// Builder for [`OfflineService`].
pub struct OfflineServiceBuilder {
    storage: Arc<dyn KeyValueStorage>,
    logger: Option<Logger>,
    clock: Option<Arc<dyn Clock>>,
    queue_prefix: String,
}

impl OfflineServiceBuilder {
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn queue_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.queue_prefix = prefix.into();
        self
    }

    pub fn build(self) -> OfflineService {
        let logger = self
            .logger
            .unwrap_or_else(|| Logger::disabled("OfflineService"));
        let tasks = TaskTracker::new();
        tasks.close();

        OfflineService {
            inner: Arc::new(Inner {
                queue: LocalQueueManager::new(self.queue_prefix, logger.child("QueueManager")),
                storage: self.storage,
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                logger,
                config: ArcSwapOption::empty(),
                resolver: RwLock::new(None),
                online: AtomicBool::new(true),
                syncing: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
                sync_gate: tokio::sync::Mutex::new(()),
                listeners: ListenerRegistry::new(),
                timer: Mutex::new(None),
                connectivity_hook: Mutex::new(None),
                shutdown: CancellationToken::new(),
                tasks,
            }),
        }
    }
}

struct Inner {
    storage: Arc<dyn KeyValueStorage>,
    queue: LocalQueueManager,
    clock: Arc<dyn Clock>,
    logger: Logger,
    config: ArcSwapOption<OfflineConfig>,
    resolver: RwLock<Option<Arc<dyn ConflictResolver>>>,
    online: AtomicBool,
    syncing: AtomicBool,
    initialized: AtomicBool,
    disposed: AtomicBool,
    sync_gate: tokio::sync::Mutex<()>,
    listeners: ListenerRegistry,
    timer: Mutex<Option<CancellationToken>>,
    connectivity_hook: Mutex<Option<CancellationToken>>,
    /// Parent of every background task's cancellation.
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl Inner {
    fn replace_timer(&self, token: Option<CancellationToken>) {
        let previous = std::mem::replace(
            &mut *self.timer.lock().unwrap_or_else(PoisonError::into_inner),
            token,
        );
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    fn replace_connectivity_hook(&self, token: Option<CancellationToken>) {
        let previous = std::mem::replace(
            &mut *self
                .connectivity_hook
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
            token,
        );
        if let Some(previous) = previous {
            previous.cancel();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Offline-first front end over a key-value storage.
///
/// Cloning is cheap and every clone drives the same service.
#[derive(Clone)]
pub struct OfflineService {
    inner: Arc<Inner>,
}

impl OfflineService {
    pub fn builder(storage: Arc<dyn KeyValueStorage>) -> OfflineServiceBuilder {
        OfflineServiceBuilder {
            storage,
            logger: None,
            clock: None,
            queue_prefix: DEFAULT_QUEUE_PREFIX.to_string(),
        }
    }

    pub fn new(storage: Arc<dyn KeyValueStorage>, logger: Logger) -> Self {
        Self::builder(storage).logger(logger).build()
    }

    fn now(&self) -> Timestamp {
        self.inner.clock.now_millis()
    }

    fn config(&self) -> Option<Arc<OfflineConfig>> {
        self.inner.config.load_full()
    }

    fn sync_enabled(&self) -> bool {
        self.config().is_some_and(|c| c.enabled)
    }

    fn ensure_initialized(&self) -> Result<(), FoodxError> {
        if self.inner.initialized.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FoodxError::not_initialized("offline service"))
        }
    }

    /// Bind storage and queue, apply `config` (disabled when `None`) and arm
    /// the periodic timer when enabled with an interval. Calling it again
    /// replaces the configuration and re-arms the timer.
    pub async fn initialize(&self, config: Option<OfflineConfig>) -> Result<(), FoodxError> {
        let inner = &self.inner;
        inner.logger.info("Initializing offline service", None);

        if let Err(e) = inner.storage.initialize().await {
            inner
                .logger
                .error("Failed to initialize offline service", Some(&e), None);
            return Err(e);
        }
        inner.queue.initialize(Arc::clone(&inner.storage));

        let config = config.unwrap_or_default();
        inner.replace_timer(None);
        if config.enabled {
            match config.sync_interval_ms {
                Some(0) => inner
                    .logger
                    .warn("Ignoring zero sync interval; periodic sync stays off", None),
                Some(ms) => self.arm_timer(Duration::from_millis(ms)),
                None => {}
            }
        }
        inner.config.store(Some(Arc::new(config)));
        inner.initialized.store(true, Ordering::SeqCst);

        inner.logger.info("Offline service initialized", None);
        Ok(())
    }

    fn arm_timer(&self, period: Duration) {
        let token = self.inner.shutdown.child_token();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let cancel = token.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        let service = OfflineService { inner };
                        if service.is_online() {
                            service.run_background_sync("Auto-sync failed").await;
                        }
                    }
                }
            }
        });

        self.inner.replace_timer(Some(token));
        self.inner.logger.debug(
            &format!("Periodic sync armed every {} ms", period.as_millis()),
            None,
        );
    }

    /// Whether the periodic timer is currently armed.
    pub fn has_periodic_sync(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    pub fn sync_state(&self) -> SyncState {
        if self.inner.syncing.load(Ordering::SeqCst) {
            SyncState::Syncing
        } else {
            SyncState::Idle
        }
    }

    /// The queue manager, for direct inspection of queued items.
    pub fn queue(&self) -> &LocalQueueManager {
        &self.inner.queue
    }

    /// Connectivity transition handler.
    ///
    /// Only an actual change emits `online`/`offline`. Going online with sync
    /// enabled starts a background pass.
    pub fn set_connectivity(&self, state: Connectivity) {
        let online = state == Connectivity::Online;
        let was_online = self.inner.online.swap(online, Ordering::SeqCst);
        if was_online == online {
            return;
        }

        let timestamp = self.now();
        if online {
            self.inner.logger.info("Device is online", None);
            self.emit(&OfflineEvent::Online { timestamp });
            if self.sync_enabled() {
                self.spawn_background_sync("Sync after reconnect failed");
            }
        } else {
            self.inner.logger.info("Device is offline", None);
            self.emit(&OfflineEvent::Offline { timestamp });
        }
    }

    /// Follow an external connectivity signal until [`dispose`] or until the
    /// sender is dropped. The current value is applied immediately. Replaces
    /// any previously attached signal. Must be called within a Tokio runtime.
    ///
    /// [`dispose`]: OfflineService::dispose
    pub fn attach_connectivity(&self, mut signal: watch::Receiver<Connectivity>) {
        let token = self.inner.shutdown.child_token();
        let cancel = token.clone();
        let weak = Arc::downgrade(&self.inner);

        let current = *signal.borrow_and_update();
        self.set_connectivity(current);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = signal.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = *signal.borrow_and_update();
                        let Some(inner) = weak.upgrade() else { break };
                        OfflineService { inner }.set_connectivity(state);
                    }
                }
            }
        });

        self.inner.replace_connectivity_hook(Some(token));
    }

    pub fn set_conflict_resolver(&self, resolver: Arc<dyn ConflictResolver>) {
        *self
            .inner
            .resolver
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(resolver);
    }

    pub fn has_conflict_resolver(&self) -> bool {
        self.inner
            .resolver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run one synchronization pass. Never fails: problems are reported in
    /// the returned [`SyncResult`].
    pub async fn sync(&self, options: SyncOptions) -> SyncResult {
        let inner = &self.inner;
        let config = match self.config() {
            Some(config) if config.enabled => config,
            _ => {
                inner.logger.warn("Sync requested but offline mode is disabled", None);
                return SyncResult::failed(self.now(), FoodxError::SyncDisabled.to_string());
            }
        };

        let gate = inner.sync_gate.lock().await;
        inner.syncing.store(true, Ordering::SeqCst);
        inner.logger.info("Starting sync", None);

        let started = self.now();
        let mut result = SyncResult::started(started);

        let outcome = match options.timeout_ms {
            Some(ms) => {
                let pass = self.run_pass(&options, &config, &mut result);
                match tokio::time::timeout(Duration::from_millis(ms), pass).await {
                    Ok(outcome) => outcome.map_err(|e| e.to_string()),
                    Err(_) => Err(format!("Sync timed out after {ms} ms")),
                }
            }
            None => self
                .run_pass(&options, &config, &mut result)
                .await
                .map_err(|e| e.to_string()),
        };

        let finished = self.now();
        result.timestamp = finished;
        result.duration = u64::try_from(finished - started).unwrap_or(0);

        inner.syncing.store(false, Ordering::SeqCst);
        drop(gate);

        match outcome {
            Ok(()) => {
                self.emit(&OfflineEvent::Sync(result.clone()));
                inner.logger.info(
                    "Sync completed successfully",
                    Some(&serde_json::json!({
                        "itemsProcessed": result.synced_item_count,
                        "duration": result.duration,
                    })),
                );
            }
            Err(message) => {
                inner.logger.error("Sync failed", Some(&message), None);
                result.success = false;
                result.error = Some(message);
            }
        }
        result
    }

    async fn run_pass(
        &self,
        options: &SyncOptions,
        config: &OfflineConfig,
        result: &mut SyncResult,
    ) -> Result<(), FoodxError> {
        let inner = &self.inner;
        if !self.is_online() && !options.force {
            return Err(FoodxError::Offline);
        }

        let pending = QueueItemFilter::new().with_status(QueuedItemStatus::Pending);
        let mut items = inner.queue.get_items(Some(&pending)).await?;
        inner.logger.debug(
            &format!("Found {} pending operations to sync", items.len()),
            None,
        );

        if let Some(types) = options.types.as_ref().filter(|t| !t.is_empty()) {
            items.retain(|item| types.contains(&item.resource_type));
        }
        if let Some(batch_size) = options.batch_size.filter(|n| *n > 0) {
            items.truncate(batch_size);
        }

        let strategy = options
            .conflict_resolution
            .unwrap_or(config.conflict_resolution);
        inner.logger.debug(
            &format!("Conflict resolution strategy for this pass: {strategy:?}"),
            None,
        );

        if !options.pull_only {
            for item in items {
                let update = QueuedItemUpdate::completed(self.now());
                if let Err(e) = inner.queue.update_item(&item.id, update).await {
                    result.failed_item_count += 1;
                    self.record_failure(&item, &e, config).await;
                    return Err(e);
                }
                result.record_synced(&item.resource_type);
            }
        }

        if !options.push_only {
            inner
                .logger
                .debug("No remote source configured; pull phase skipped", None);
        }
        Ok(())
    }

    /// Best-effort bookkeeping for an item the push phase could not complete.
    async fn record_failure(&self, item: &QueuedItem, error: &FoodxError, config: &OfflineConfig) {
        let attempts = item.attempts.saturating_add(1);
        let status = if attempts >= config.max_sync_retries {
            QueuedItemStatus::Failed
        } else {
            QueuedItemStatus::Pending
        };
        let update = QueuedItemUpdate::status(status)
            .with_attempts(attempts)
            .with_last_error(error.to_string())
            .with_last_attempt_at(self.now());

        if let Err(e) = self.inner.queue.update_item(&item.id, update).await {
            self.inner.logger.warn(
                &format!("Could not record sync failure for item {}: {e}", item.id),
                None,
            );
        }
    }

    async fn run_background_sync(&self, failure_message: &str) {
        let result = self.sync(SyncOptions::default()).await;
        if !result.success {
            let reason = result.error.unwrap_or_default();
            self.inner
                .logger
                .error(failure_message, Some(&reason), None);
        }
    }

    fn spawn_background_sync(&self, failure_message: &'static str) {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            inner
                .logger
                .warn("No async runtime available; background sync skipped", None);
            return;
        };

        let service = self.clone();
        let shutdown = inner.shutdown.clone();
        inner.tasks.spawn_on(
            async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = service.run_background_sync(failure_message) => {}
                }
            },
            &handle,
        );
    }

    /// Wait until every background pass spawned so far has finished.
    pub async fn wait_for_background(&self) {
        self.inner.tasks.wait().await;
    }

    /// Queue an operation as a pending item and return its id. While online
    /// with sync enabled a background pass is started.
    pub async fn queue_operation(&self, operation: QueuedOperation) -> Result<String, FoodxError> {
        self.ensure_initialized()?;
        let inner = &self.inner;
        inner.logger.debug(
            "Queueing operation",
            Some(&serde_json::json!({"type": &operation.operation_type})),
        );

        let item = NewQueuedItem {
            operation_type: operation.operation_type,
            resource_type: operation.resource_type,
            resource_id: operation.resource_id,
            data: operation.data,
            options: operation.options,
            status: QueuedItemStatus::Pending,
            queued_at: self.now(),
            last_attempt_at: None,
            attempts: 0,
            last_error: None,
            priority: operation.priority.unwrap_or(0),
        };

        let id = match inner.queue.add_item(item).await {
            Ok(id) => id,
            Err(e) => {
                inner.logger.error("Failed to queue operation", Some(&e), None);
                return Err(e);
            }
        };
        inner
            .logger
            .debug(&format!("Operation queued with ID: {id}"), None);

        if self.is_online() && self.sync_enabled() {
            self.spawn_background_sync("Auto-sync after queue failed");
        }
        Ok(id)
    }

    /// Cache `data` under `key` with a timestamped envelope.
    pub async fn store_data(
        &self,
        key: &str,
        data: Value,
        options: Option<StoreOptions>,
    ) -> Result<(), FoodxError> {
        self.ensure_initialized()?;
        let inner = &self.inner;
        inner
            .logger
            .debug(&format!("Storing data with key: {key}"), None);

        let entry = CachedEntry {
            data,
            metadata: CacheMetadata {
                timestamp: self.now(),
                options,
            },
        };
        let stored = match serde_json::to_value(&entry) {
            Ok(value) => inner.storage.set_item(key, &value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = stored {
            inner
                .logger
                .error(&format!("Failed to store data: {key}"), Some(&e), None);
            return Err(e);
        }
        Ok(())
    }

    /// Read back a value cached by [`store_data`]. Expired entries are
    /// deleted and reported as absent.
    ///
    /// [`store_data`]: OfflineService::store_data
    pub async fn get_data(&self, key: &str) -> Result<Option<Value>, FoodxError> {
        self.ensure_initialized()?;
        let inner = &self.inner;

        let Some(raw) = inner.storage.get_item(key).await? else {
            return Ok(None);
        };
        let entry: CachedEntry = serde_json::from_value(raw)?;

        if entry.is_expired(self.now()) {
            inner.logger.debug(&format!("Data expired: {key}"), None);
            inner.storage.remove_item(key).await?;
            return Ok(None);
        }
        Ok(Some(entry.data))
    }

    /// Items still waiting to be pushed: pending or in progress.
    pub async fn get_pending_operations(&self) -> Result<Vec<QueuedItem>, FoodxError> {
        self.ensure_initialized()?;
        let filter = QueueItemFilter::new()
            .with_statuses([QueuedItemStatus::Pending, QueuedItemStatus::InProgress]);
        self.inner.queue.get_items(Some(&filter)).await
    }

    /// Remove every pending item (in-progress items stay) and return how many went.
    pub async fn clear_pending_operations(&self) -> Result<usize, FoodxError> {
        self.ensure_initialized()?;
        let inner = &self.inner;
        let filter = QueueItemFilter::new().with_status(QueuedItemStatus::Pending);
        let pending = inner.queue.get_items(Some(&filter)).await?;

        for item in &pending {
            inner.queue.remove_item(&item.id).await?;
        }
        inner
            .logger
            .info(&format!("Cleared {} pending operations", pending.len()), None);
        Ok(pending.len())
    }

    /// Register `listener` for `kind`. Registering the same handle twice is a no-op.
    pub fn on(&self, kind: OfflineEventKind, listener: Arc<dyn EventListener>) {
        self.inner.listeners.add(kind, listener);
    }

    pub fn off(&self, kind: OfflineEventKind, listener: &Arc<dyn EventListener>) {
        self.inner.listeners.remove(kind, listener);
    }

    fn emit(&self, event: &OfflineEvent) {
        self.inner.listeners.emit(event, &self.inner.logger);
    }

    /// Stop the timer, detach the connectivity signal, cancel background
    /// passes and drop all listeners. Safe to call more than once.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.replace_timer(None);
        inner.replace_connectivity_hook(None);
        inner.shutdown.cancel();
        inner.listeners.clear();
        inner.logger.info("Offline service disposed", None);
    }
}
