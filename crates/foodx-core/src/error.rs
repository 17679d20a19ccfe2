// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the FoodX SDK.

use thiserror::Error;

/// The primary error type used across all FoodX adapter traits and services.
#[derive(Debug, Error)]
pub enum FoodxError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A component was used before its `initialize()` completed.
    #[error("{component} not initialized -- call initialize() first")]
    NotInitialized { component: String },

    /// A queue item with the given id does not exist.
    #[error("queue item not found: {id}")]
    ItemNotFound { id: String },

    /// The storage backend cannot be acquired in this environment.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// The storage backend failed while performing I/O.
    #[error("storage backend error: {source}")]
    Backend {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller passed a value the component refuses (e.g. an empty key).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Synchronization was requested while offline mode is switched off.
    #[error("Offline mode is disabled")]
    SyncDisabled,

    /// A non-forced synchronization was requested while offline.
    #[error("Cannot sync while offline")]
    Offline,

    /// Requested adapter was not found in the registry.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Blockchain adapter errors (submission failure, unknown contract).
    #[error("blockchain error: {message}")]
    Blockchain {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The policy engine rejected an action.
    #[error("permission denied: {principal} may not {action} {resource}")]
    PermissionDenied {
        principal: String,
        action: String,
        resource: String,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FoodxError {
    /// Shorthand for [`FoodxError::NotInitialized`].
    pub fn not_initialized(component: impl Into<String>) -> Self {
        Self::NotInitialized {
            component: component.into(),
        }
    }

    /// Wraps an underlying backend fault.
    pub fn backend<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(source),
        }
    }
}
