// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline-first support for the FoodX SDK.
//!
//! Operations recorded while the device is disconnected are kept in a
//! persistent queue ([`LocalQueueManager`]) and pushed by [`OfflineService`]
//! once connectivity returns, on a timer, or on demand. The service also
//! caches arbitrary JSON values with optional lazy expiry.

pub mod events;
pub mod filter;
pub mod item;
pub mod queue;
pub mod service;
pub mod sync;

pub use events::{
    CallbackListener, EventListener, ListenerError, ListenerRegistry, OfflineEvent,
    OfflineEventKind, listener_fn,
};
pub use filter::{QueueItemFilter, SortDirection, SortField};
pub use item::{NewQueuedItem, QueuedItem, QueuedItemStatus, QueuedItemUpdate, QueuedOperation};
pub use queue::LocalQueueManager;
pub use service::{DEFAULT_QUEUE_PREFIX, OfflineService, OfflineServiceBuilder, StoreOptions};
pub use sync::{
    ConflictOutcome, ConflictResolver, Connectivity, ResolvedConflict, SyncOptions, SyncResult,
    SyncState,
};
