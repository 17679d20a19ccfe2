// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Collects every violation instead of failing on the first one.

use crate::diagnostic::ConfigError;
use crate::model::{ConflictResolution, FoodxConfig, StorageBackendKind};

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &FoodxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.client.tenant.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "client.tenant must not be empty".to_string(),
        });
    }

    if config.offline.sync_interval_ms == Some(0) {
        errors.push(ConfigError::Validation {
            message: "offline.sync_interval_ms must be greater than zero when set".to_string(),
        });
    }

    if config.offline.conflict_resolution == ConflictResolution::Custom {
        tracing::warn!(
            "offline.conflict_resolution is `custom`; install a resolver on the offline service"
        );
    }

    if config.storage.backend == StorageBackendKind::Persistent
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty for the persistent backend"
                .to_string(),
        });
    }

    if config.storage.key_prefix.is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.key_prefix must not be empty".to_string(),
        });
    }

    if config.storage.queue_prefix.is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.queue_prefix must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
