// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes ledger calls to the adapter selected by [`BlockchainService::configure`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Value, json};

use foodx_core::types::{TransactionOptions, TransactionResult};
use foodx_core::{BlockchainAdapter, BlockchainType, FoodxError, Logger};

use crate::adapters::{EthereumAdapter, FabricAdapter};

type ActiveAdapter = (BlockchainType, Arc<dyn BlockchainAdapter>);

/// Registry of network adapters with one active selection.
pub struct BlockchainService {
    adapters: HashMap<BlockchainType, Arc<dyn BlockchainAdapter>>,
    active: RwLock<Option<ActiveAdapter>>,
    logger: Logger,
}

impl BlockchainService {
    /// A service with the Ethereum and Hyperledger Fabric adapters registered.
    pub fn new(logger: Logger) -> Self {
        let mut service = Self::empty(logger);
        service.register_adapter(Arc::new(EthereumAdapter::new(
            service.logger.child("EthereumAdapter"),
        )));
        service.register_adapter(Arc::new(FabricAdapter::new(
            service.logger.child("FabricAdapter"),
        )));
        service
    }

    /// A service with no adapters.
    pub fn empty(logger: Logger) -> Self {
        Self {
            adapters: HashMap::new(),
            active: RwLock::new(None),
            logger,
        }
    }

    /// Register `adapter` for its network, replacing any previous one.
    pub fn register_adapter(&mut self, adapter: Arc<dyn BlockchainAdapter>) {
        let network = adapter.network();
        self.logger
            .debug(&format!("Registered blockchain adapter for {network}"), None);
        self.adapters.insert(network, adapter);
    }

    pub async fn initialize(&self) -> Result<(), FoodxError> {
        self.logger.info("Initializing blockchain service", None);
        self.logger.info("Blockchain service initialized", None);
        Ok(())
    }

    /// Initialize the adapter for `network` with `config` and make it active.
    /// The previous selection stays active if initialization fails.
    pub async fn configure(&self, network: BlockchainType, config: &Value) -> Result<(), FoodxError> {
        self.logger
            .info(&format!("Configuring blockchain service for {network}"), None);
        let adapter = self
            .adapters
            .get(&network)
            .cloned()
            .ok_or_else(|| FoodxError::AdapterNotFound {
                adapter_type: "blockchain".into(),
                name: network.to_string(),
            })?;

        adapter.initialize(config).await?;
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some((network, adapter));

        self.logger
            .info(&format!("Blockchain service configured for {network}"), None);
        Ok(())
    }

    pub fn active_network(&self) -> Option<BlockchainType> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(network, _)| *network)
    }

    pub fn registered_networks(&self) -> Vec<BlockchainType> {
        let mut networks: Vec<_> = self.adapters.keys().copied().collect();
        networks.sort_by_key(|n| n.to_string());
        networks
    }

    fn active_adapter(&self) -> Result<Arc<dyn BlockchainAdapter>, FoodxError> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, adapter)| Arc::clone(adapter))
            .ok_or_else(|| FoodxError::not_initialized("blockchain adapter"))
    }

    pub async fn submit_transaction(
        &self,
        contract_name: &str,
        function_name: &str,
        args: &[String],
        options: Option<&TransactionOptions>,
    ) -> Result<TransactionResult, FoodxError> {
        let adapter = self.active_adapter()?;
        self.logger.debug(
            &format!("Submitting transaction to {contract_name}.{function_name}"),
            Some(&json!({ "args": args })),
        );

        match adapter
            .submit_transaction(contract_name, function_name, args, options)
            .await
        {
            Ok(result) => {
                self.logger.debug(
                    "Transaction submitted",
                    Some(&json!({ "transactionId": result.transaction_id, "success": result.success })),
                );
                Ok(result)
            }
            Err(e) => {
                self.logger.error(
                    &format!("Failed to submit transaction to {contract_name}.{function_name}"),
                    Some(&e),
                    None,
                );
                Err(e)
            }
        }
    }

    pub async fn query_blockchain(
        &self,
        contract_name: &str,
        function_name: &str,
        args: &[String],
    ) -> Result<Value, FoodxError> {
        let adapter = self.active_adapter()?;
        adapter
            .query_blockchain(contract_name, function_name, args)
            .await
            .inspect_err(|e| {
                self.logger.error(
                    &format!("Failed to query {contract_name}.{function_name}"),
                    Some(e),
                    None,
                );
            })
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> Result<Value, FoodxError> {
        self.active_adapter()?.get_transaction(transaction_id).await
    }

    pub async fn get_blockchain_info(&self) -> Result<Value, FoodxError> {
        self.active_adapter()?.get_blockchain_info().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> BlockchainService {
        BlockchainService::new(Logger::disabled("test"))
    }

    #[tokio::test]
    async fn operations_need_an_active_adapter() {
        let svc = service();
        svc.initialize().await.unwrap();
        assert_eq!(svc.active_network(), None);
        assert!(matches!(
            svc.get_blockchain_info().await,
            Err(FoodxError::NotInitialized { .. })
        ));
    }

    #[tokio::test]
    async fn configure_switches_active_network() {
        let svc = service();
        svc.configure(BlockchainType::Ethereum, &json!({})).await.unwrap();
        assert_eq!(svc.active_network(), Some(BlockchainType::Ethereum));
        let tx = svc.submit_transaction("Lots", "create", &[], None).await.unwrap();
        assert!(tx.transaction_id.starts_with("0x"));

        svc.configure(BlockchainType::HyperledgerFabric, &json!({"channel": "c1"}))
            .await
            .unwrap();
        assert_eq!(svc.active_network(), Some(BlockchainType::HyperledgerFabric));
        let info = svc.get_blockchain_info().await.unwrap();
        assert_eq!(info["channel"], json!("c1"));
    }

    #[tokio::test]
    async fn unknown_network_is_adapter_not_found() {
        let svc = BlockchainService::empty(Logger::disabled("test"));
        let err = svc
            .configure(BlockchainType::Ethereum, &Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, FoodxError::AdapterNotFound { .. }));
    }

    #[tokio::test]
    async fn failed_configure_keeps_previous_selection() {
        let svc = service();
        svc.configure(BlockchainType::Ethereum, &Value::Null).await.unwrap();
        assert!(
            svc.configure(BlockchainType::HyperledgerFabric, &json!({"channel": 5}))
                .await
                .is_err()
        );
        assert_eq!(svc.active_network(), Some(BlockchainType::Ethereum));
    }

    #[test]
    fn both_networks_registered() {
        assert_eq!(
            service().registered_networks(),
            vec![BlockchainType::Ethereum, BlockchainType::HyperledgerFabric]
        );
    }
}
