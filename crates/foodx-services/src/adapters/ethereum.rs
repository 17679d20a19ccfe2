// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ethereum adapter backed by a local ledger.

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

/// Gas charged for every stub transaction, the cost of a plain transfer.
const TRANSFER_GAS: u64 = 21_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EthereumSettings {
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    chain_id: Option<u64>,
}

pub struct EthereumAdapter {
    settings: RwLock<Option<EthereumSettings>>,
    ledger: LocalLedger,
    clock: Arc<dyn Clock>,
    logger: Logger,
}

impl EthereumAdapter {
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

    fn settings(&self) -> Result<EthereumSettings, FoodxError> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| FoodxError::not_initialized("ethereum adapter"))
    }
}

#[async_trait]
impl Adapter for EthereumAdapter {
    fn name(&self) -> &str {
        "ethereum"
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
impl BlockchainAdapter for EthereumAdapter {
    fn network(&self) -> BlockchainType {
        BlockchainType::Ethereum
    }

    async fn initialize(&self, config: &Value) -> Result<(), FoodxError> {
        let settings: EthereumSettings = if config.is_null() {
            EthereumSettings::default()
        } else {
            serde_json::from_value(config.clone())
                .map_err(|e| FoodxError::Config(format!("invalid ethereum settings: {e}")))?
        };
        self.logger.info(
            &format!(
                "Initializing Ethereum adapter for network: {}",
                settings.network.as_deref().unwrap_or("mainnet")
            ),
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
        options: Option<&TransactionOptions>,
    ) -> Result<TransactionResult, FoodxError> {
        self.settings()?;
        self.logger.debug(
            &format!("Submitting transaction to {contract_name}.{function_name}"),
            Some(&json!({ "args": args })),
        );

        let gas_used = match options.and_then(|o| o.gas_limit) {
            Some(limit) if limit < TRANSFER_GAS => {
                return Ok(TransactionResult {
                    transaction_id: transaction_hash(),
                    success: false,
                    block_number: None,
                    timestamp: Some(self.clock.now_millis()),
                    error: Some(format!("gas limit {limit} below intrinsic gas {TRANSFER_GAS}")),
                    gas_used: None,
                    result: None,
                });
            }
            _ => TRANSFER_GAS,
        };

        Ok(self.ledger.append(TransactionResult {
            transaction_id: transaction_hash(),
            success: true,
            block_number: None,
            timestamp: Some(self.clock.now_millis()),
            error: None,
            gas_used: Some(gas_used),
            result: Some(json!({
                "contract": contract_name,
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
        self.settings()?;
        self.logger.debug(
            &format!("Querying {contract_name}.{function_name}"),
            Some(&json!({ "args": args })),
        );
        Ok(json!({
            "contract": contract_name,
            "function": function_name,
            "args": args,
            "blockNumber": self.ledger.height(),
            "timestamp": self.clock.now_millis(),
        }))
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Value, FoodxError> {
        self.settings()?;
        let tx = self.ledger.get(transaction_id)?;
        Ok(json!({
            "hash": tx.transaction_id,
            "blockNumber": tx.block_number,
            "timestamp": tx.timestamp,
            "gasUsed": tx.gas_used,
            "status": 1,
        }))
    }

    async fn get_blockchain_info(&self) -> Result<Value, FoodxError> {
        let settings = self.settings()?;
        Ok(json!({
            "network": settings.network.unwrap_or_else(|| "mainnet".into()),
            "endpoint": settings.endpoint,
            "chainId": settings.chain_id,
            "currentBlock": self.ledger.height(),
            "transactions": self.ledger.len(),
            "connectionStatus": "connected",
        }))
    }
}

fn transaction_hash() -> String {
    format!("0x{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> EthereumAdapter {
        EthereumAdapter::new(Logger::disabled("test"))
    }

    #[tokio::test]
    async fn calls_before_initialize_fail() {
        let eth = adapter();
        let err = eth
            .submit_transaction("Registry", "record", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, FoodxError::NotInitialized { .. }));
    }

    #[tokio::test]
    async fn submitted_transactions_can_be_looked_up() {
        let eth = adapter();
        eth.initialize(&json!({"chainId": 11155111, "network": "sepolia"}))
            .await
            .unwrap();

        let tx = eth
            .submit_transaction("Registry", "record", &["lot-7".into()], None)
            .await
            .unwrap();
        assert!(tx.success);
        assert!(tx.transaction_id.starts_with("0x"));
        assert_eq!(tx.gas_used, Some(TRANSFER_GAS));
        assert_eq!(tx.block_number, Some(1));

        let found = eth.get_transaction(&tx.transaction_id).await.unwrap();
        assert_eq!(found["blockNumber"], json!(1));

        let info = eth.get_blockchain_info().await.unwrap();
        assert_eq!(info["network"], json!("sepolia"));
        assert_eq!(info["chainId"], json!(11155111));
        assert_eq!(info["currentBlock"], json!(1));
    }

    #[tokio::test]
    async fn low_gas_limit_is_rejected_in_result() {
        let eth = adapter();
        eth.initialize(&Value::Null).await.unwrap();
        let options = TransactionOptions {
            gas_limit: Some(1_000),
            ..TransactionOptions::default()
        };
        let tx = eth
            .submit_transaction("Registry", "record", &[], Some(&options))
            .await
            .unwrap();
        assert!(!tx.success);
        assert!(tx.error.unwrap().contains("below intrinsic gas"));
        assert_eq!(eth.get_blockchain_info().await.unwrap()["currentBlock"], json!(0));
    }

    #[tokio::test]
    async fn malformed_settings_are_config_errors() {
        let eth = adapter();
        let err = eth.initialize(&json!({"chainId": "one"})).await.unwrap_err();
        assert!(matches!(err, FoodxError::Config(_)));
    }
}
