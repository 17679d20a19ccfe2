// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client assembly, initialization order and status reporting.

use std::sync::Arc;

use serde_json::json;

use foodx::config::{FoodxConfig, OfflineConfig, StorageBackendKind, load_config_from_str};
use foodx::{
    BlockchainType, Connectivity, ExportFormat, FoodxClient, FoodxError, QueuedOperation,
    SyncOptions,
};
use foodx_test_utils::FailingStorage;

fn memory_config() -> FoodxConfig {
    let mut config = FoodxConfig::default();
    config.storage.backend = StorageBackendKind::Memory;
    config.offline = OfflineConfig::enabled();
    config.logging.console = false;
    config
}

#[tokio::test]
async fn accessors_fail_before_initialize() {
    let client = FoodxClient::new(memory_config());
    assert!(matches!(client.offline(), Err(FoodxError::NotInitialized { .. })));
    assert!(client.blockchain().is_err());
    assert!(client.status().await.is_err());
}

#[tokio::test]
async fn initialized_client_exposes_services() {
    let client = FoodxClient::new(memory_config());
    client.initialize().await.unwrap();

    let offline = client.offline().unwrap();
    offline.set_connectivity(Connectivity::Offline);
    offline
        .queue_operation(QueuedOperation::new("create", "product", json!({"sku": "A1"})))
        .await
        .unwrap();

    let status = client.status().await.unwrap();
    assert_eq!(status.tenant, "default");
    assert!(status.offline_enabled);
    assert!(!status.online);
    assert_eq!(status.queue.get("pending"), Some(&1));
    assert_eq!(status.blockchain_network, None);

    let result = offline.sync(SyncOptions::forced()).await;
    assert!(result.success);
    assert_eq!(client.status().await.unwrap().queue.get("completed"), Some(&1));

    let csv = client
        .compliance()
        .unwrap()
        .export(&[json!({"sku": "A1"})], ExportFormat::Csv)
        .unwrap();
    assert_eq!(csv, "sku\nA1\n");
}

#[tokio::test]
async fn endpoint_activates_configured_network() {
    let mut config = memory_config();
    config.blockchain.network = BlockchainType::HyperledgerFabric;
    config.blockchain.endpoint = Some("grpcs://peer0.example:7051".into());
    config.blockchain.channel = Some("harvest".into());

    let client = FoodxClient::new(config);
    client.initialize().await.unwrap();

    let chain = client.blockchain().unwrap();
    assert_eq!(chain.active_network(), Some(BlockchainType::HyperledgerFabric));
    let info = chain.get_blockchain_info().await.unwrap();
    assert_eq!(info["channel"], json!("harvest"));
}

#[tokio::test]
async fn storage_failure_aborts_initialize() {
    let storage = Arc::new(FailingStorage::new());
    storage.fail_initialize(true);
    let client = FoodxClient::with_storage(memory_config(), storage);

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(err, FoodxError::StorageUnavailable { .. }));
    assert!(!client.is_initialized());
}

#[tokio::test]
async fn persistent_backend_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = memory_config();
    config.storage.backend = StorageBackendKind::Persistent;
    config.storage.database_path = dir.path().join("offline.db").to_string_lossy().into_owned();

    {
        let client = FoodxClient::new(config.clone());
        client.initialize().await.unwrap();
        let offline = client.offline().unwrap();
        offline.set_connectivity(Connectivity::Offline);
        offline
            .store_data("catalog", json!(["apples"]), None)
            .await
            .unwrap();
        client.shutdown();
    }

    let client = FoodxClient::new(config);
    client.initialize().await.unwrap();
    assert_eq!(
        client.offline().unwrap().get_data("catalog").await.unwrap(),
        Some(json!(["apples"]))
    );
}

#[tokio::test]
async fn shutdown_is_final() {
    let client = FoodxClient::new(memory_config());
    client.initialize().await.unwrap();
    client.shutdown();
    client.shutdown();

    assert!(client.offline().is_err());
    assert!(matches!(
        client.initialize().await,
        Err(FoodxError::Internal(_))
    ));
}

#[tokio::test]
async fn toml_configuration_drives_client() {
    let config = load_config_from_str(
        r#"
        [client]
        tenant = "acme-foods"

        [offline]
        enabled = true

        [storage]
        backend = "memory"

        [logging]
        console = false
        "#,
    )
    .unwrap();

    let client = FoodxClient::new(config);
    client.initialize().await.unwrap();
    assert_eq!(client.status().await.unwrap().tenant, "acme-foods");
}
