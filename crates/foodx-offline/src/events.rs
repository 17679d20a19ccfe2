// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline service events and the listener registry.
//!
//! Emission iterates a snapshot of the registered listeners, so a listener
//! may register or unregister others (or itself) while being called.
//! Listener errors and panics are logged and never reach the emitter.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use strum::Display;

use foodx_core::{Logger, Timestamp};

use crate::sync::SyncResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OfflineEvent {
    Online { timestamp: Timestamp },
    Offline { timestamp: Timestamp },
    Sync(SyncResult),
}

impl OfflineEvent {
    pub fn kind(&self) -> OfflineEventKind {
        match self {
            Self::Online { .. } => OfflineEventKind::Online,
            Self::Offline { .. } => OfflineEventKind::Offline,
            Self::Sync(_) => OfflineEventKind::Sync,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OfflineEventKind {
    Online,
    Offline,
    Sync,
}

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives offline service events.
pub trait EventListener: Send + Sync + 'static {
    fn on_event(&self, event: &OfflineEvent) -> Result<(), ListenerError>;
}

/// Adapts a fallible closure into an [`EventListener`].
pub struct CallbackListener<F> {
    callback: F,
}

impl<F> CallbackListener<F>
where
    F: Fn(&OfflineEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> EventListener for CallbackListener<F>
where
    F: Fn(&OfflineEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    fn on_event(&self, event: &OfflineEvent) -> Result<(), ListenerError> {
        (self.callback)(event)
    }
}

/// Wrap an infallible closure as a shareable listener handle. Keep the
/// returned `Arc` to unregister it later.
pub fn listener_fn<F>(callback: F) -> Arc<dyn EventListener>
where
    F: Fn(&OfflineEvent) + Send + Sync + 'static,
{
    Arc::new(CallbackListener::new(move |event: &OfflineEvent| {
        callback(event);
        Ok(())
    }))
}

/// Listeners per event kind, with set semantics on handle identity.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<HashMap<OfflineEventKind, Vec<Arc<dyn EventListener>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. Returns `false` if it was already registered for `kind`.
    pub fn add(&self, kind: OfflineEventKind, listener: Arc<dyn EventListener>) -> bool {
        let mut map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = map.entry(kind).or_default();
        if entries.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        entries.push(listener);
        true
    }

    /// Unregister `listener`. Returns `false` if it was not registered for `kind`.
    pub fn remove(&self, kind: OfflineEventKind, listener: &Arc<dyn EventListener>) -> bool {
        let mut map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = map.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|l| !Arc::ptr_eq(l, listener));
        before != entries.len()
    }

    pub fn count(&self, kind: OfflineEventKind) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Deliver `event` to every listener registered for its kind.
    pub fn emit(&self, event: &OfflineEvent, logger: &Logger) {
        let kind = event.kind();
        let snapshot: Vec<Arc<dyn EventListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for listener in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    logger.error(&format!("Error in {kind} event listener"), Some(&err), None);
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    logger.error(&format!("Error in {kind} event listener"), Some(&reason), None);
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "listener panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    fn counter() -> (Arc<AtomicUsize>, Arc<dyn EventListener>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let listener = listener_fn(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, listener)
    }

    fn online() -> OfflineEvent {
        OfflineEvent::Online { timestamp: 1 }
    }

    #[test]
    fn same_handle_registers_once() {
        let registry = ListenerRegistry::new();
        let (hits, listener) = counter();
        assert!(registry.add(OfflineEventKind::Online, Arc::clone(&listener)));
        assert!(!registry.add(OfflineEventKind::Online, Arc::clone(&listener)));

        registry.emit(&online(), &Logger::disabled("test"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let registry = ListenerRegistry::new();
        let (hits, listener) = counter();
        registry.add(OfflineEventKind::Online, Arc::clone(&listener));
        assert!(registry.remove(OfflineEventKind::Online, &listener));
        assert!(!registry.remove(OfflineEventKind::Online, &listener));

        registry.emit(&online(), &Logger::disabled("test"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn events_route_by_kind() {
        let registry = ListenerRegistry::new();
        let (hits, listener) = counter();
        registry.add(OfflineEventKind::Offline, listener);
        registry.emit(&online(), &Logger::disabled("test"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        registry.emit(&OfflineEvent::Offline { timestamp: 2 }, &Logger::disabled("test"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn failing_and_panicking_listeners_do_not_stop_delivery() {
        let registry = ListenerRegistry::new();
        let failing: Arc<dyn EventListener> =
            Arc::new(CallbackListener::new(|_: &OfflineEvent| Err("rejected".into())));
        let panicking = listener_fn(|_| panic!("listener blew up"));
        let (hits, healthy) = counter();

        registry.add(OfflineEventKind::Online, failing);
        registry.add(OfflineEventKind::Online, panicking);
        registry.add(OfflineEventKind::Online, healthy);

        registry.emit(&online(), &Logger::new("test", foodx_core::LogLevel::Debug));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(logs_contain("Error in online event listener"));
        assert!(logs_contain("rejected"));
        assert!(logs_contain("listener blew up"));
    }

    #[test]
    fn listener_may_unregister_itself_during_emit() {
        let registry = Arc::new(ListenerRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Arc<dyn EventListener>>>> = Arc::new(Mutex::new(None));

        let listener = {
            let registry = Arc::clone(&registry);
            let slot = Arc::clone(&slot);
            let hits = Arc::clone(&hits);
            listener_fn(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                if let Some(me) = slot.lock().unwrap().take() {
                    registry.remove(OfflineEventKind::Online, &me);
                }
            })
        };
        *slot.lock().unwrap() = Some(Arc::clone(&listener));
        registry.add(OfflineEventKind::Online, listener);

        registry.emit(&online(), &Logger::disabled("test"));
        registry.emit(&online(), &Logger::disabled("test"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.count(OfflineEventKind::Online), 0);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let value = serde_json::to_value(OfflineEvent::Offline { timestamp: 9 }).unwrap();
        assert_eq!(value, serde_json::json!({"type": "offline", "timestamp": 9}));
    }
}
