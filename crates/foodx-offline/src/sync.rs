// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronization pass options, outcomes and state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use foodx_config::ConflictResolution;
use foodx_core::Timestamp;

/// Knobs for a single synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncOptions {
    /// Only push items whose `resource_type` is listed. Empty means all.
    pub types: Option<Vec<String>>,
    /// Push at most this many items. Zero means all.
    pub batch_size: Option<usize>,
    /// Run even while offline.
    pub force: bool,
    /// Upper bound on the whole pass.
    pub timeout_ms: Option<u64>,
    /// Overrides the configured strategy for this pass.
    pub conflict_resolution: Option<ConflictResolution>,
    pub push_only: bool,
    pub pull_only: bool,
}

impl SyncOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn push_only(mut self) -> Self {
        self.push_only = true;
        self
    }

    pub fn pull_only(mut self) -> Self {
        self.pull_only = true;
        self
    }
}

/// How a single conflict was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictOutcome {
    ClientWins,
    ServerWins,
    Merged,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConflict {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub resolution: ConflictOutcome,
}

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Completion time.
    pub timestamp: Timestamp,
    pub synced_item_count: usize,
    pub conflict_count: usize,
    #[serde(default)]
    pub failed_item_count: usize,
    /// Milliseconds from pass start to pass end.
    pub duration: u64,
    /// Resource types touched by the push phase, first-seen order, no duplicates.
    pub synced_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_conflicts: Option<Vec<ResolvedConflict>>,
}

impl SyncResult {
    pub(crate) fn started(timestamp: Timestamp) -> Self {
        Self {
            success: true,
            error: None,
            timestamp,
            synced_item_count: 0,
            conflict_count: 0,
            failed_item_count: 0,
            duration: 0,
            synced_types: Vec::new(),
            resolved_conflicts: None,
        }
    }

    pub(crate) fn failed(timestamp: Timestamp, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::started(timestamp)
        }
    }

    pub(crate) fn record_synced(&mut self, resource_type: &str) {
        self.synced_item_count += 1;
        if !self.synced_types.iter().any(|t| t == resource_type) {
            self.synced_types.push(resource_type.to_string());
        }
    }
}

/// Whether a synchronization pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncState {
    Idle,
    Syncing,
}

/// Network reachability as seen by the offline service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline,
}

/// Reconciles a local and a remote version of the same record under the
/// `custom` strategy.
pub trait ConflictResolver: Send + Sync + 'static {
    fn resolve(&self, local: &Value, remote: &Value) -> Value;
}

impl<F> ConflictResolver for F
where
    F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
{
    fn resolve(&self, local: &Value, remote: &Value) -> Value {
        self(local, remote)
    }
}
