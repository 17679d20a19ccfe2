// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value storage backends for the FoodX SDK.
//!
//! Two implementations of [`foodx_core::KeyValueStorage`]:
//! a persistent, namespaced SQLite store driven through `tokio-rusqlite`'s
//! single background thread, and a volatile in-memory map.

pub mod backend;
pub mod database;
pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use backend::create_storage;
pub use database::Database;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
