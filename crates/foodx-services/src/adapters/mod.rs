// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blockchain network adapters.

pub mod ethereum;
pub mod fabric;

pub use ethereum::EthereumAdapter;
pub use fabric::FabricAdapter;

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use foodx_core::FoodxError;
use foodx_core::types::TransactionResult;

/// Transactions accepted by a stub adapter, with a monotonically growing
/// block height.
#[derive(Default)]
pub(crate) struct LocalLedger {
    transactions: DashMap<String, TransactionResult>,
    height: AtomicU64,
}

impl LocalLedger {
    /// Seal `result` into the next block and remember it.
    pub(crate) fn append(&self, mut result: TransactionResult) -> TransactionResult {
        let block = self.height.fetch_add(1, Ordering::SeqCst) + 1;
        result.block_number = Some(block);
        self.transactions
            .insert(result.transaction_id.clone(), result.clone());
        result
    }

    pub(crate) fn get(&self, transaction_id: &str) -> Result<TransactionResult, FoodxError> {
        self.transactions
            .get(transaction_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FoodxError::Blockchain {
                message: format!("unknown transaction: {transaction_id}"),
                source: None,
            })
    }

    pub(crate) fn height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        self.transactions.len()
    }
}
