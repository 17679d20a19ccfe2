// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FoodX SDK.
//!
//! [`FoodxClient`] bundles the offline service with the blockchain,
//! enterprise, compliance and ecosystem services behind one configuration:
//!
//! ```no_run
//! # async fn run() -> Result<(), foodx::FoodxError> {
//! use foodx::{FoodxClient, QueuedOperation};
//!
//! let config = foodx::config::load_config_from_str("[offline]\nenabled = true\n")
//!     .map_err(|e| foodx::FoodxError::Config(e.to_string()))?;
//! let client = FoodxClient::new(config);
//! client.initialize().await?;
//!
//! let offline = client.offline()?;
//! offline
//!     .queue_operation(QueuedOperation::new("create", "product", serde_json::json!({"sku": "A1"})))
//!     .await?;
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod telemetry;

pub use client::{ClientStatus, FoodxClient};
pub use foodx_config as config;
pub use foodx_core::{BlockchainType, FoodxError, LogLevel, Logger};
pub use foodx_offline::{
    Connectivity, OfflineEvent, OfflineEventKind, OfflineService, QueuedItem, QueuedItemStatus,
    QueuedOperation, StoreOptions, SyncOptions, SyncResult, listener_fn,
};
pub use foodx_services::{
    BlockchainService, ComplianceService, EcosystemService, EnterpriseService, ExportFormat,
};
