// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the FoodX SDK.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the FoodX workspace. Storage backends and
//! blockchain adapters implement traits defined here.

pub mod clock;
pub mod error;
pub mod logger;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::FoodxError;
pub use logger::{LogLevel, Logger};
pub use types::{AdapterType, BlockchainType, HealthStatus, Timestamp};

// Re-export all adapter traits at crate root.
pub use traits::{Adapter, BlockchainAdapter, KeyValueStorage};
