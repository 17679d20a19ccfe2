// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the FoodX SDK.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use foodx_core::{BlockchainType, LogLevel, Logger};
use serde::{Deserialize, Serialize};

/// Top-level FoodX configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FoodxConfig {
    /// Tenant identity and API access.
    #[serde(default)]
    pub client: ClientConfig,

    /// Offline queue and synchronization settings.
    #[serde(default)]
    pub offline: OfflineConfig,

    /// Key-value storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Diagnostic logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Blockchain network selection.
    #[serde(default)]
    pub blockchain: BlockchainConfig,
}

/// Tenant identity for multi-tenant deployments.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Tenant identifier.
    #[serde(default = "default_tenant")]
    pub tenant: String,

    /// API key for authenticated endpoints.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for API requests.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tenant: default_tenant(),
            api_key: None,
            base_url: None,
        }
    }
}

fn default_tenant() -> String {
    "default".to_string()
}

/// Strategy tag for reconciling local and remote versions of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    ClientWins,
    ServerWins,
    #[default]
    TimestampBased,
    /// Delegate to a resolver installed on the offline service.
    Custom,
}

/// Offline queue configuration.
///
/// Only `enabled` and `sync_interval_ms` drive behaviour today. The remaining
/// fields are accepted and carried so that configs written for later
/// releases keep loading.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OfflineConfig {
    /// Master switch for synchronization.
    #[serde(default)]
    pub enabled: bool,

    /// Period of automatic sync passes. Absent disables periodic sync.
    #[serde(default)]
    pub sync_interval_ms: Option<u64>,

    /// Attempts before a queued item is marked failed.
    #[serde(default = "default_max_sync_retries")]
    pub max_sync_retries: u32,

    /// Default conflict resolution strategy.
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,

    /// Storage quota hint in bytes.
    #[serde(default)]
    pub max_storage_size: Option<u64>,

    /// Retention hint in days.
    #[serde(default)]
    pub data_retention_days: Option<u32>,

    /// Whether sensitive payloads may be written to local storage.
    #[serde(default)]
    pub persist_sensitive_data: bool,

    /// Encryption key hint for local payloads.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sync_interval_ms: None,
            max_sync_retries: default_max_sync_retries(),
            conflict_resolution: ConflictResolution::default(),
            max_storage_size: None,
            data_retention_days: None,
            persist_sensitive_data: false,
            encryption_key: None,
        }
    }
}

impl OfflineConfig {
    /// An enabled config with periodic sync every `interval_ms`.
    pub fn enabled_with_interval(interval_ms: u64) -> Self {
        Self {
            enabled: true,
            sync_interval_ms: Some(interval_ms),
            ..Self::default()
        }
    }

    /// An enabled config without periodic sync.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

fn default_max_sync_retries() -> u32 {
    3
}

/// Which key-value backend the SDK stores into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// SQLite file shared by all tenants, keys namespaced by `key_prefix`.
    #[default]
    Persistent,
    /// Process-local map, lost on exit.
    Memory,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// Path to the SQLite database file (`:memory:` for a private in-memory database).
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Namespace prepended to every key written by the persistent backend.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Namespace prepended to queue item ids.
    #[serde(default = "default_queue_prefix")]
    pub queue_prefix: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            database_path: default_database_path(),
            key_prefix: default_key_prefix(),
            queue_prefix: default_queue_prefix(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("foodx").join("offline.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("foodx-offline.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_key_prefix() -> String {
    "foodx:".to_string()
}

fn default_queue_prefix() -> String {
    "queue:".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Diagnostic logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level emitted by component loggers.
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Emit to the console subscriber at all.
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: default_console(),
        }
    }
}

impl LoggingConfig {
    /// Build a component logger honouring this configuration.
    pub fn logger(&self, context: &str) -> Logger {
        if self.console {
            Logger::new(context, self.level)
        } else {
            Logger::disabled(context)
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_console() -> bool {
    true
}

/// Blockchain network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockchainConfig {
    /// Network to activate during client initialization.
    #[serde(default = "default_network")]
    pub network: BlockchainType,

    /// Node or gateway endpoint. When absent no adapter is activated.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// EVM chain id.
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Fabric channel name.
    #[serde(default)]
    pub channel: Option<String>,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            endpoint: None,
            chain_id: None,
            channel: None,
        }
    }
}

fn default_network() -> BlockchainType {
    BlockchainType::Ethereum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_defaults_to_disabled() {
        let config = OfflineConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.sync_interval_ms, None);
        assert_eq!(config.max_sync_retries, 3);
        assert_eq!(config.conflict_resolution, ConflictResolution::TimestampBased);
    }

    #[test]
    fn conflict_resolution_uses_kebab_case() {
        let parsed: OfflineConfig =
            toml::from_str("enabled = true\nconflict_resolution = \"client-wins\"").unwrap();
        assert_eq!(parsed.conflict_resolution, ConflictResolution::ClientWins);
    }

    #[test]
    fn disabled_console_yields_silent_logger() {
        let logging = LoggingConfig {
            level: LogLevel::Debug,
            console: false,
        };
        assert!(!logging.logger("x").enabled_for(LogLevel::Error));
    }

    #[test]
    fn storage_prefixes_have_defaults() {
        let storage = StorageConfig::default();
        assert_eq!(storage.key_prefix, "foodx:");
        assert_eq!(storage.queue_prefix, "queue:");
        assert_eq!(storage.backend, StorageBackendKind::Persistent);
    }
}
