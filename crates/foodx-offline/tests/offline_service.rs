// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end behaviour of the offline service over the test harness.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tracing_test::traced_test;

use foodx_config::OfflineConfig;
use foodx_core::FoodxError;
use foodx_offline::{
    Connectivity, EventListener, OfflineEventKind, QueuedItemStatus, QueuedItemUpdate,
    StoreOptions, SyncOptions, SyncState,
};
use foodx_test_utils::{FailingListener, TestHarness};

async fn offline_harness() -> TestHarness {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.service.set_connectivity(Connectivity::Offline);
    harness
}

#[tokio::test]
async fn forced_sync_pushes_only_requested_types() {
    let harness = offline_harness().await;
    harness
        .queue_many(&["product", "product", "transaction", "product", "transaction"])
        .await
        .unwrap();

    let result = harness
        .service
        .sync(SyncOptions::forced().with_types(["product"]))
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.synced_item_count, 3);
    assert_eq!(result.synced_types, vec!["product"]);
    assert_eq!(result.failed_item_count, 0);

    let pending = harness.service.get_pending_operations().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|i| i.resource_type == "transaction"));

    let syncs = harness.events.sync_results();
    assert_eq!(syncs.len(), 1);
    assert_eq!(syncs[0], result);
}

#[tokio::test]
async fn offline_sync_requires_force() {
    let harness = offline_harness().await;
    harness.queue_many(&["shipment"]).await.unwrap();

    let result = harness.service.sync(SyncOptions::default()).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Cannot sync while offline"));
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 0);
    assert_eq!(harness.service.get_pending_operations().await.unwrap().len(), 1);

    let forced = harness.service.sync(SyncOptions::forced()).await;
    assert!(forced.success);
    assert_eq!(forced.synced_item_count, 1);
    assert!(harness.service.get_pending_operations().await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_service_reports_without_touching_queue() {
    let harness = TestHarness::builder().without_config().build().await.unwrap();
    harness.service.set_connectivity(Connectivity::Offline);
    harness.queue_many(&["product"]).await.unwrap();

    // Reads would fail if the pass looked at the queue.
    harness.storage.fail_reads(true);
    let result = harness.service.sync(SyncOptions::forced()).await;
    harness.storage.fail_reads(false);

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Offline mode is disabled"));
    assert_eq!(result.synced_item_count, 0);
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 0);
    assert_eq!(harness.service.get_pending_operations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn pull_only_leaves_queue_untouched() {
    let harness = offline_harness().await;
    harness.queue_many(&["product", "transaction"]).await.unwrap();

    let result = harness.service.sync(SyncOptions::forced().pull_only()).await;
    assert!(result.success);
    assert_eq!(result.synced_item_count, 0);
    assert!(result.synced_types.is_empty());

    let pending = harness.service.get_pending_operations().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|i| i.status == QueuedItemStatus::Pending));
}

#[tokio::test]
async fn batch_size_caps_pushed_items() {
    let harness = offline_harness().await;
    harness.queue_many(&["a", "b", "c"]).await.unwrap();

    let result = harness.service.sync(SyncOptions::forced().with_batch_size(2)).await;
    assert_eq!(result.synced_item_count, 2);
    assert_eq!(harness.service.get_pending_operations().await.unwrap().len(), 1);

    let unbounded = harness.service.sync(SyncOptions::forced().with_batch_size(0)).await;
    assert_eq!(unbounded.synced_item_count, 1);
}

#[tokio::test]
async fn push_failure_aborts_pass_without_event() {
    let harness = offline_harness().await;
    harness.queue_many(&["product", "product"]).await.unwrap();

    harness.storage.fail_writes(true);
    let result = harness.service.sync(SyncOptions::forced()).await;
    harness.storage.fail_writes(false);

    assert!(!result.success);
    assert_eq!(result.failed_item_count, 1);
    assert_eq!(result.synced_item_count, 0);
    assert!(result.error.unwrap().contains("injected write failure"));
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 0);
    assert_eq!(harness.service.sync_state(), SyncState::Idle);

    let retry = harness.service.sync(SyncOptions::forced()).await;
    assert!(retry.success);
    assert_eq!(retry.synced_item_count, 2);
}

#[tokio::test]
async fn failed_push_is_recorded_on_the_item() {
    let config = OfflineConfig {
        max_sync_retries: 2,
        ..OfflineConfig::enabled()
    };
    let harness = TestHarness::builder().with_config(config).build().await.unwrap();
    harness.service.set_connectivity(Connectivity::Offline);
    let ids = harness.queue_many(&["product"]).await.unwrap();

    let first_at = harness.clock.advance(10);
    harness.storage.fail_next_writes(1);
    let first = harness.service.sync(SyncOptions::forced()).await;
    assert!(!first.success);
    assert_eq!(first.failed_item_count, 1);

    let item = harness.service.queue().get_item(&ids[0]).await.unwrap().unwrap();
    assert_eq!(item.status, QueuedItemStatus::Pending);
    assert_eq!(item.attempts, 1);
    assert_eq!(item.last_attempt_at, Some(first_at));
    assert!(item.last_error.as_deref().unwrap().contains("injected write failure"));

    harness.storage.fail_next_writes(1);
    let second = harness.service.sync(SyncOptions::forced()).await;
    assert!(!second.success);

    let item = harness.service.queue().get_item(&ids[0]).await.unwrap().unwrap();
    assert_eq!(item.status, QueuedItemStatus::Failed);
    assert_eq!(item.attempts, 2);

    // Failed items are no longer picked up.
    let third = harness.service.sync(SyncOptions::forced()).await;
    assert!(third.success);
    assert_eq!(third.synced_item_count, 0);
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_aborts_pass_with_partial_counts() {
    let harness = offline_harness().await;
    harness.queue_many(&["product", "product", "product"]).await.unwrap();
    harness.storage.delay_writes(Duration::from_millis(100));

    let result = harness
        .service
        .sync(SyncOptions::forced().with_timeout_ms(150))
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Sync timed out after 150 ms"));
    assert_eq!(result.synced_item_count, 1);
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 0);
    assert_eq!(harness.service.sync_state(), SyncState::Idle);
}

#[tokio::test]
async fn cached_data_under_queue_prefix_does_not_block_sync() {
    let harness = offline_harness().await;
    harness.queue_many(&["product"]).await.unwrap();
    harness
        .service
        .store_data("queue:menu", json!({"dishes": 3}), None)
        .await
        .unwrap();

    assert_eq!(harness.service.get_pending_operations().await.unwrap().len(), 1);

    let result = harness.service.sync(SyncOptions::forced()).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.synced_item_count, 1);
    assert_eq!(
        harness.service.get_data("queue:menu").await.unwrap(),
        Some(json!({"dishes": 3}))
    );
}

#[tokio::test]
async fn completed_items_record_attempt_time() {
    let harness = offline_harness().await;
    let ids = harness.queue_many(&["product"]).await.unwrap();

    let now = harness.clock.advance(250);
    harness.service.sync(SyncOptions::forced()).await;

    let item = harness.service.queue().get_item(&ids[0]).await.unwrap().unwrap();
    assert_eq!(item.status, QueuedItemStatus::Completed);
    assert_eq!(item.last_attempt_at, Some(now));
}

#[tokio::test]
async fn concurrent_passes_never_push_an_item_twice() {
    let harness = offline_harness().await;
    harness.queue_many(&["a", "b", "c", "d"]).await.unwrap();

    let (first, second) = tokio::join!(
        harness.service.sync(SyncOptions::forced()),
        harness.service.sync(SyncOptions::forced()),
    );
    assert_eq!(first.synced_item_count + second.synced_item_count, 4);
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 2);
}

#[tokio::test]
async fn cached_data_expires_strictly_after_lifetime() {
    let harness = offline_harness().await;
    harness
        .service
        .store_data("menu", json!({"dishes": 12}), Some(StoreOptions::expires_in(1_000)))
        .await
        .unwrap();

    harness.clock.advance(1_000);
    assert_eq!(
        harness.service.get_data("menu").await.unwrap(),
        Some(json!({"dishes": 12}))
    );

    harness.clock.advance(1);
    assert_eq!(harness.service.get_data("menu").await.unwrap(), None);
    assert!(harness.storage.inner().is_empty().await);
}

#[tokio::test]
async fn missing_key_reads_as_none() {
    let harness = offline_harness().await;
    assert_eq!(harness.service.get_data("nothing").await.unwrap(), None);
}

#[tokio::test]
async fn storage_read_errors_propagate() {
    let harness = offline_harness().await;
    harness.service.store_data("k", json!(1), None).await.unwrap();
    harness.storage.fail_reads(true);
    assert!(matches!(
        harness.service.get_data("k").await,
        Err(FoodxError::Backend { .. })
    ));
}

#[tokio::test]
async fn clearing_keeps_in_progress_items() {
    let harness = offline_harness().await;
    let ids = harness.queue_many(&["product", "product", "product"]).await.unwrap();
    harness
        .service
        .queue()
        .update_item(&ids[1], QueuedItemUpdate::status(QueuedItemStatus::InProgress))
        .await
        .unwrap();

    assert_eq!(harness.service.clear_pending_operations().await.unwrap(), 2);

    let remaining = harness.service.get_pending_operations().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ids[1]);
    assert_eq!(remaining[0].status, QueuedItemStatus::InProgress);
}

#[tokio::test]
#[traced_test]
async fn failing_listener_does_not_block_others() {
    let failing = Arc::new(FailingListener::new());
    let failing_handle: Arc<dyn EventListener> = failing.clone();
    // Registered ahead of the recorder, so the recorder runs after the failure.
    let harness = TestHarness::builder()
        .with_listener(OfflineEventKind::Sync, failing_handle)
        .build()
        .await
        .unwrap();
    harness.service.set_connectivity(Connectivity::Offline);

    let result = harness.service.sync(SyncOptions::forced()).await;

    assert!(result.success);
    assert_eq!(failing.calls(), 1);
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 1);
    assert!(logs_contain("Error in sync event listener"));
}

#[tokio::test]
async fn unregistered_listener_is_silent() {
    let harness = offline_harness().await;
    let failing = Arc::new(FailingListener::new());
    let handle: Arc<dyn EventListener> = failing.clone();
    harness.service.on(OfflineEventKind::Sync, handle.clone());
    harness.service.off(OfflineEventKind::Sync, &handle);

    harness.service.sync(SyncOptions::forced()).await;
    assert_eq!(failing.calls(), 0);
}

#[tokio::test]
async fn reconnect_triggers_background_sync() {
    let harness = offline_harness().await;
    harness.queue_many(&["product", "transaction"]).await.unwrap();

    harness.service.set_connectivity(Connectivity::Online);
    harness.service.wait_for_background().await;

    assert_eq!(
        harness.events.kinds(),
        vec![
            OfflineEventKind::Offline,
            OfflineEventKind::Online,
            OfflineEventKind::Sync
        ]
    );
    assert_eq!(harness.events.sync_results()[0].synced_item_count, 2);
    assert!(harness.service.get_pending_operations().await.unwrap().is_empty());
}

#[tokio::test]
async fn queueing_online_starts_background_sync() {
    let harness = TestHarness::builder().build().await.unwrap();
    let ids = harness.queue_many(&["product"]).await.unwrap();
    harness.service.wait_for_background().await;

    let item = harness.service.queue().get_item(&ids[0]).await.unwrap().unwrap();
    assert_eq!(item.status, QueuedItemStatus::Completed);
}

#[tokio::test]
async fn repeated_connectivity_is_not_an_event() {
    let harness = offline_harness().await;
    harness.service.set_connectivity(Connectivity::Offline);
    harness.service.set_connectivity(Connectivity::Offline);
    assert_eq!(harness.events.count(OfflineEventKind::Offline), 1);
    assert!(!harness.service.is_online());
}

#[tokio::test(start_paused = true)]
async fn periodic_timer_syncs_each_interval() {
    let harness = TestHarness::builder()
        .with_config(OfflineConfig::enabled_with_interval(1_000))
        .build()
        .await
        .unwrap();
    assert!(harness.service.has_periodic_sync());

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 3);

    harness.service.dispose();
    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert!(!harness.service.has_periodic_sync());
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 3);
}

#[tokio::test(start_paused = true)]
async fn timer_skips_passes_while_offline() {
    let harness = TestHarness::builder()
        .with_config(OfflineConfig::enabled_with_interval(1_000))
        .build()
        .await
        .unwrap();
    harness.service.set_connectivity(Connectivity::Offline);

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 0);
}

#[tokio::test(start_paused = true)]
async fn reinitialize_replaces_timer() {
    let harness = TestHarness::builder()
        .with_config(OfflineConfig::enabled_with_interval(1_000))
        .build()
        .await
        .unwrap();

    harness.service.initialize(Some(OfflineConfig::enabled())).await.unwrap();
    assert!(!harness.service.has_periodic_sync());

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(harness.events.count(OfflineEventKind::Sync), 0);
}

#[tokio::test]
async fn attached_signal_drives_connectivity() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (tx, rx) = watch::channel(Connectivity::Online);
    harness.service.attach_connectivity(rx);
    assert!(harness.events.events().is_empty());

    tx.send(Connectivity::Offline).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.events.count(OfflineEventKind::Offline) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(!harness.service.is_online());
}

#[tokio::test]
async fn dispose_silences_listeners() {
    let harness = offline_harness().await;
    harness.service.dispose();
    harness.service.dispose();

    harness.service.set_connectivity(Connectivity::Online);
    assert_eq!(harness.events.kinds(), vec![OfflineEventKind::Offline]);
}

#[tokio::test]
async fn storage_initialize_failure_propagates() {
    let harness = TestHarness::builder().uninitialized().build().await.unwrap();
    harness.storage.fail_initialize(true);

    let err = harness.service.initialize(None).await.unwrap_err();
    assert!(matches!(err, FoodxError::StorageUnavailable { .. }));
    assert!(matches!(
        harness.service.get_pending_operations().await,
        Err(FoodxError::NotInitialized { .. })
    ));
}

#[tokio::test]
async fn conflict_resolver_can_be_installed() {
    let harness = offline_harness().await;
    assert!(!harness.service.has_conflict_resolver());
    harness
        .service
        .set_conflict_resolver(Arc::new(|_: &serde_json::Value, remote: &serde_json::Value| {
            remote.clone()
        }));
    assert!(harness.service.has_conflict_resolver());
}
