// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the FoodX SDK.
//!
//! All adapters extend the [`Adapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod blockchain;
pub mod storage;

pub use adapter::Adapter;
pub use blockchain::BlockchainAdapter;
pub use storage::KeyValueStorage;
