// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The SDK entry point.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::{Map, Value};

use foodx_config::{BlockchainConfig, FoodxConfig};
use foodx_core::{BlockchainType, FoodxError, KeyValueStorage, Logger};
use foodx_offline::{OfflineService, SyncState};
use foodx_services::{BlockchainService, ComplianceService, EcosystemService, EnterpriseService};
use foodx_storage::create_storage;

/// Point-in-time summary of the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatus {
    pub tenant: String,
    pub initialized: bool,
    pub offline_enabled: bool,
    pub online: bool,
    pub sync_state: SyncState,
    /// Queued items per status, keyed by the status' wire name.
    pub queue: BTreeMap<String, usize>,
    pub blockchain_network: Option<BlockchainType>,
}

/// Owns every FoodX service and their shared storage.
pub struct FoodxClient {
    config: FoodxConfig,
    logger: Logger,
    blockchain: BlockchainService,
    offline: OfflineService,
    enterprise: EnterpriseService,
    compliance: ComplianceService,
    ecosystem: EcosystemService,
    initialized: AtomicBool,
    closed: AtomicBool,
}

impl FoodxClient {
    /// Build a client with the storage backend named in `config.storage`.
    pub fn new(config: FoodxConfig) -> Self {
        let logger = config.logging.logger("FoodxClient");
        let storage = create_storage(&config.storage, &logger.child("Storage"));
        Self::assemble(config, storage, logger)
    }

    /// Build a client over an existing storage backend.
    pub fn with_storage(config: FoodxConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        let logger = config.logging.logger("FoodxClient");
        Self::assemble(config, storage, logger)
    }

    fn assemble(config: FoodxConfig, storage: Arc<dyn KeyValueStorage>, logger: Logger) -> Self {
        let offline = OfflineService::builder(storage)
            .logger(logger.child("OfflineService"))
            .queue_prefix(config.storage.queue_prefix.clone())
            .build();

        Self {
            blockchain: BlockchainService::new(logger.child("BlockchainService")),
            enterprise: EnterpriseService::new(logger.child("EnterpriseService")),
            compliance: ComplianceService::new(logger.child("ComplianceService")),
            ecosystem: EcosystemService::new(logger.child("EcosystemService")),
            offline,
            config,
            logger,
            initialized: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Initialize every service: blockchain, offline, enterprise, compliance,
    /// ecosystem. The first failure stops the sequence and is returned.
    pub async fn initialize(&self) -> Result<(), FoodxError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FoodxError::Internal("FoodX client has been shut down".into()));
        }
        self.logger.info(
            &format!("Initializing FoodX client for tenant {}", self.config.client.tenant),
            None,
        );

        let result = self.initialize_services().await;
        match &result {
            Ok(()) => {
                self.initialized.store(true, Ordering::SeqCst);
                self.logger.info("FoodX client initialized", None);
            }
            Err(e) => self
                .logger
                .error("Failed to initialize FoodX client", Some(e), None),
        }
        result
    }

    async fn initialize_services(&self) -> Result<(), FoodxError> {
        self.blockchain.initialize().await?;
        if let Some(settings) = adapter_settings(&self.config.blockchain) {
            self.blockchain
                .configure(self.config.blockchain.network, &settings)
                .await?;
        }
        self.offline.initialize(Some(self.config.offline.clone())).await?;
        self.enterprise.initialize().await?;
        self.compliance.initialize().await?;
        self.ecosystem.initialize().await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn ready(&self) -> Result<(), FoodxError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(FoodxError::not_initialized("FoodX client"))
        }
    }

    pub fn config(&self) -> &FoodxConfig {
        &self.config
    }

    pub fn blockchain(&self) -> Result<&BlockchainService, FoodxError> {
        self.ready().map(|()| &self.blockchain)
    }

    pub fn offline(&self) -> Result<&OfflineService, FoodxError> {
        self.ready().map(|()| &self.offline)
    }

    pub fn enterprise(&self) -> Result<&EnterpriseService, FoodxError> {
        self.ready().map(|()| &self.enterprise)
    }

    pub fn compliance(&self) -> Result<&ComplianceService, FoodxError> {
        self.ready().map(|()| &self.compliance)
    }

    pub fn ecosystem(&self) -> Result<&EcosystemService, FoodxError> {
        self.ready().map(|()| &self.ecosystem)
    }

    pub async fn status(&self) -> Result<ClientStatus, FoodxError> {
        self.ready()?;
        let queue = self
            .offline
            .queue()
            .count_by_status()
            .await?
            .into_iter()
            .map(|(status, n)| (status.to_string(), n))
            .collect();

        Ok(ClientStatus {
            tenant: self.config.client.tenant.clone(),
            initialized: true,
            offline_enabled: self.config.offline.enabled,
            online: self.offline.is_online(),
            sync_state: self.offline.sync_state(),
            queue,
            blockchain_network: self.blockchain.active_network(),
        })
    }

    /// Stop background work for good. Accessors and `initialize` fail afterwards.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.initialized.store(false, Ordering::SeqCst);
        self.offline.dispose();
        self.logger.info("FoodX client shut down", None);
    }
}

/// Adapter settings derived from configuration, or `None` when no endpoint
/// is configured.
fn adapter_settings(config: &BlockchainConfig) -> Option<Value> {
    let endpoint = config.endpoint.as_ref()?;
    let mut settings = Map::new();
    settings.insert("endpoint".into(), Value::from(endpoint.as_str()));
    if let Some(chain_id) = config.chain_id {
        settings.insert("chainId".into(), Value::from(chain_id));
    }
    if let Some(channel) = &config.channel {
        settings.insert("channel".into(), Value::from(channel.as_str()));
    }
    Some(Value::Object(settings))
}
