// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queued offline work items and their partial updates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use foodx_core::Timestamp;

/// Lifecycle state of a queued item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum QueuedItemStatus {
    Pending,
    InProgress,
    Failed,
    Completed,
}

/// A unit of work recorded while offline, persisted as JSON under
/// `<queue-prefix><id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedItem {
    pub id: String,
    pub operation_type: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub options: Map<String, Value>,
    pub status: QueuedItemStatus,
    pub queued_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<Timestamp>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Higher is more urgent.
    #[serde(default)]
    pub priority: i32,
}

/// A queued item before the queue manager assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQueuedItem {
    pub operation_type: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub data: Value,
    pub options: Map<String, Value>,
    pub status: QueuedItemStatus,
    pub queued_at: Timestamp,
    pub last_attempt_at: Option<Timestamp>,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub priority: i32,
}

impl NewQueuedItem {
    /// A fresh pending item with no attempts.
    pub fn pending(
        operation_type: impl Into<String>,
        resource_type: impl Into<String>,
        data: Value,
        queued_at: Timestamp,
    ) -> Self {
        Self {
            operation_type: operation_type.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            data,
            options: Map::new(),
            status: QueuedItemStatus::Pending,
            queued_at,
            last_attempt_at: None,
            attempts: 0,
            last_error: None,
            priority: 0,
        }
    }

    pub fn with_id(self, id: String) -> QueuedItem {
        QueuedItem {
            id,
            operation_type: self.operation_type,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            data: self.data,
            options: self.options,
            status: self.status,
            queued_at: self.queued_at,
            last_attempt_at: self.last_attempt_at,
            attempts: self.attempts,
            last_error: self.last_error,
            priority: self.priority,
        }
    }
}

/// Shallow patch applied by `update_item`. `None` leaves a field untouched;
/// the nested options on nullable fields allow clearing them.
///
/// `id` and `queued_at` are not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueuedItemUpdate {
    pub operation_type: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<Option<String>>,
    pub data: Option<Value>,
    pub options: Option<Map<String, Value>>,
    pub status: Option<QueuedItemStatus>,
    pub last_attempt_at: Option<Option<Timestamp>>,
    pub attempts: Option<u32>,
    pub last_error: Option<Option<String>>,
    pub priority: Option<i32>,
}

impl QueuedItemUpdate {
    pub fn status(status: QueuedItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Mark an item pushed at `at`.
    pub fn completed(at: Timestamp) -> Self {
        Self {
            status: Some(QueuedItemStatus::Completed),
            last_attempt_at: Some(Some(at)),
            ..Self::default()
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_last_error(mut self, error: impl Into<String>) -> Self {
        self.last_error = Some(Some(error.into()));
        self
    }

    pub fn with_last_attempt_at(mut self, at: Timestamp) -> Self {
        self.last_attempt_at = Some(Some(at));
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn apply(self, item: &mut QueuedItem) {
        if let Some(v) = self.operation_type {
            item.operation_type = v;
        }
        if let Some(v) = self.resource_type {
            item.resource_type = v;
        }
        if let Some(v) = self.resource_id {
            item.resource_id = v;
        }
        if let Some(v) = self.data {
            item.data = v;
        }
        if let Some(v) = self.options {
            item.options = v;
        }
        if let Some(v) = self.status {
            item.status = v;
        }
        if let Some(v) = self.last_attempt_at {
            item.last_attempt_at = v;
        }
        if let Some(v) = self.attempts {
            item.attempts = v;
        }
        if let Some(v) = self.last_error {
            item.last_error = v;
        }
        if let Some(v) = self.priority {
            item.priority = v;
        }
    }
}

/// Caller-facing description of an operation to queue while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    #[serde(rename = "type")]
    pub operation_type: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub options: Map<String, Value>,
    /// Defaults to 0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl QueuedOperation {
    pub fn new(
        operation_type: impl Into<String>,
        resource_type: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            operation_type: operation_type.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            data,
            options: Map::new(),
            priority: None,
        }
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}
