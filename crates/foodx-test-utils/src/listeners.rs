// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event listeners for asserting on what the offline service emitted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use foodx_offline::{EventListener, ListenerError, OfflineEvent, OfflineEventKind, SyncResult};

/// Captures every event it receives, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<OfflineEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OfflineEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<OfflineEventKind> {
        self.events().iter().map(OfflineEvent::kind).collect()
    }

    pub fn count(&self, kind: OfflineEventKind) -> usize {
        self.events().iter().filter(|e| e.kind() == kind).count()
    }

    /// Payloads of the captured `sync` events.
    pub fn sync_results(&self) -> Vec<SyncResult> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OfflineEvent::Sync(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventListener for RecordingListener {
    fn on_event(&self, event: &OfflineEvent) -> Result<(), ListenerError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Rejects every event, counting how often it was called.
#[derive(Debug, Default)]
pub struct FailingListener {
    calls: AtomicUsize,
}

impl FailingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EventListener for FailingListener {
    fn on_event(&self, event: &OfflineEvent) -> Result<(), ListenerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(format!("listener rejected {} event", event.kind()).into())
    }
}
