// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hyperledger Fabric adapter backed by a local ledger.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use foodx_core::types::{TransactionOptions, TransactionResult};
use foodx_core::{
    Adapter, AdapterType, BlockchainAdapter, BlockchainType, Clock, FoodxError, HealthStatus,
    Logger, SystemClock,
};

use super::LocalLedger;

const DEFAULT_CHANNEL: &str = "mychannel";
const DEFAULT_MSP: &str = "Org1MSP";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FabricSettings {
    #[serde(default = "default_channel")]
    channel: String,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default = "default_msp")]
    msp_id: String,
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.into()
}

fn default_msp() -> String {
    DEFAULT_MSP.into()
}

pub struct FabricAdapter {
    settings: RwLock<Option<FabricSettings>>,
    ledger: LocalLedger,
    clock: Arc<dyn Clock>,
    logger: Logger,
}

impl FabricAdapter {
    pub fn new(logger: Logger) -> Self {
        Self::with_clock(logger, Arc::new(SystemClock))
    }

    pub fn with_clock(logger: Logger, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings: RwLock::new(None),
            ledger: LocalLedger::default(),
            clock,
            logger,
        }
    }

    fn settings(&self) -> Result<FabricSettings, FoodxError> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| FoodxError::not_initialized("fabric adapter"))
    }
}

#[async_trait]
impl Adapter for FabricAdapter {
    fn name(&self) -> &str {
        "hyperledger-fabric"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Blockchain
    }

    async fn health_check(&self) -> Result<HealthStatus, FoodxError> {
        Ok(match self.settings() {
            Ok(_) => HealthStatus::Healthy,
            Err(_) => HealthStatus::Unhealthy("not configured".into()),
        })
    }
}

#[async_trait]
impl BlockchainAdapter for FabricAdapter {
    fn network(&self) -> BlockchainType {
        BlockchainType::HyperledgerFabric
    }

    async fn initialize(&self, config: &Value) -> Result<(), FoodxError> {
        let config = if config.is_null() { json!({}) } else { config.clone() };
        let settings: FabricSettings = serde_json::from_value(config)
            .map_err(|e| FoodxError::Config(format!("invalid fabric settings: {e}")))?;
        self.logger.info(
            &format!("Initializing Fabric adapter for channel: {}", settings.channel),
            None,
        );
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = Some(settings);
        Ok(())
    }

    async fn submit_transaction(
        &self,
        contract_name: &str,
        function_name: &str,
        args: &[String],
        _options: Option<&TransactionOptions>,
    ) -> Result<TransactionResult, FoodxError> {
        let settings = self.settings()?;
        self.logger.debug(
            &format!("Submitting transaction to {contract_name}.{function_name}"),
            Some(&json!({ "args": args, "channel": settings.channel })),
        );

        Ok(self.ledger.append(TransactionResult {
            transaction_id: format!("fabric-tx-{}", uuid::Uuid::new_v4().simple()),
            success: true,
            block_number: None,
            timestamp: Some(self.clock.now_millis()),
            error: None,
            gas_used: None,
            result: Some(json!({
                "chaincode": contract_name,
                "function": function_name,
                "args": args,
            })),
        }))
    }

    async fn query_blockchain(
        &self,
        contract_name: &str,
        function_name: &str,
        args: &[String],
    ) -> Result<Value, FoodxError> {
        let settings = self.settings()?;
        Ok(json!({
            "channel": settings.channel,
            "chaincode": contract_name,
            "function": function_name,
            "args": args,
            "timestamp": self.clock.now_millis(),
        }))
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Value, FoodxError> {
        let settings = self.settings()?;
        let tx = self.ledger.get(transaction_id)?;
        Ok(json!({
            "txId": tx.transaction_id,
            "channelId": settings.channel,
            "blockNumber": tx.block_number,
            "timestamp": tx.timestamp,
            "creator": { "mspid": settings.msp_id },
            "validationCode": "VALID",
        }))
    }

    async fn get_blockchain_info(&self) -> Result<Value, FoodxError> {
        let settings = self.settings()?;
        Ok(json!({
            "channel": settings.channel,
            "endpoint": settings.endpoint,
            "blocks": self.ledger.height(),
            "status": "active",
        }))
    }
}
