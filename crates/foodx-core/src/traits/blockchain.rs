// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blockchain adapter trait for ledger networks (Ethereum, Hyperledger Fabric).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FoodxError;
use crate::traits::adapter::Adapter;
use crate::types::{BlockchainType, TransactionOptions, TransactionResult};

/// Adapter for a single blockchain network.
///
/// The SDK treats networks as opaque submit/query endpoints: adapters own
/// connection details and transaction encoding.
#[async_trait]
pub trait BlockchainAdapter: Adapter {
    /// The network this adapter speaks to.
    fn network(&self) -> BlockchainType;

    /// Applies network-specific configuration (endpoint, credentials, chain id).
    async fn initialize(&self, config: &Value) -> Result<(), FoodxError>;

    /// Submits a state-changing transaction.
    async fn submit_transaction(
        &self,
        contract_name: &str,
        function_name: &str,
        args: &[String],
        options: Option<&TransactionOptions>,
    ) -> Result<TransactionResult, FoodxError>;

    /// Evaluates a read-only contract function.
    async fn query_blockchain(
        &self,
        contract_name: &str,
        function_name: &str,
        args: &[String],
    ) -> Result<Value, FoodxError>;

    /// Looks up a previously submitted transaction.
    async fn get_transaction(&self, transaction_id: &str) -> Result<Value, FoodxError>;

    /// Returns network metadata (height, chain id, peers).
    async fn get_blockchain_info(&self) -> Result<Value, FoodxError>;
}
