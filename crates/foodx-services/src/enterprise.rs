// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role-based permission checks and the audit trail.
//!
//! Roles map to sets of [`Permission`]s and principals hold any number of
//! roles. Every [`EnterpriseService::require_permission`] decision is written
//! to the audit log, allowed or not.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use foodx_core::{Clock, FoodxError, Logger, SystemClock, Timestamp};

const WILDCARD: &str = "*";

/// Grants `action` on `resource`. Either side may be `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub action: String,
    pub resource: String,
}

impl Permission {
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
        }
    }

    fn grants(&self, action: &str, resource: &str) -> bool {
        (self.action == WILDCARD || self.action == action)
            && (self.resource == WILDCARD || self.resource == resource)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AuditEventType {
    Authentication,
    Authorization,
    DataAccess,
    DataModification,
    ConfigurationChange,
    SecurityAlert,
    UserManagement,
    ApiKeyManagement,
    BlockchainTransaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuditEventStatus {
    Success,
    Failure,
    Blocked,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// An audit record before the service stamps it with an id and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEntry {
    pub actor: String,
    pub event_type: AuditEventType,
    pub action: String,
    pub resource: String,
    pub status: AuditEventStatus,
    pub severity: AuditSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NewAuditEntry {
    pub fn new(
        actor: impl Into<String>,
        event_type: AuditEventType,
        action: impl Into<String>,
        resource: impl Into<String>,
        status: AuditEventStatus,
    ) -> Self {
        Self {
            actor: actor.into(),
            event_type,
            action: action.into(),
            resource: resource.into(),
            status,
            severity: AuditSeverity::Info,
            metadata: None,
            error: None,
        }
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub entry: NewAuditEntry,
}

/// Audit log query. Unset fields match everything; results are oldest first.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor: Option<String>,
    pub event_type: Option<AuditEventType>,
    pub status: Option<AuditEventStatus>,
    pub min_severity: Option<AuditSeverity>,
    /// Inclusive lower bound.
    pub since: Option<Timestamp>,
    /// Inclusive upper bound.
    pub until: Option<Timestamp>,
    /// Keep only the most recent `limit` matches.
    pub limit: Option<usize>,
}

impl AuditFilter {
    fn matches(&self, e: &AuditEntry) -> bool {
        self.actor.as_ref().is_none_or(|a| *a == e.entry.actor)
            && self.event_type.is_none_or(|t| t == e.entry.event_type)
            && self.status.is_none_or(|s| s == e.entry.status)
            && self.min_severity.is_none_or(|s| e.entry.severity >= s)
            && self.since.is_none_or(|t| e.timestamp >= t)
            && self.until.is_none_or(|t| e.timestamp <= t)
    }
}

pub struct EnterpriseService {
    roles: DashMap<String, HashSet<Permission>>,
    assignments: DashMap<String, HashSet<String>>,
    audit: RwLock<Vec<AuditEntry>>,
    clock: Arc<dyn Clock>,
    logger: Logger,
}

impl EnterpriseService {
    pub fn new(logger: Logger) -> Self {
        Self::with_clock(logger, Arc::new(SystemClock))
    }

    pub fn with_clock(logger: Logger, clock: Arc<dyn Clock>) -> Self {
        Self {
            roles: DashMap::new(),
            assignments: DashMap::new(),
            audit: RwLock::new(Vec::new()),
            clock,
            logger,
        }
    }

    pub async fn initialize(&self) -> Result<(), FoodxError> {
        self.logger.info("Enterprise service initialized", None);
        Ok(())
    }

    /// Create or replace a role.
    pub fn define_role(&self, role: &str, permissions: impl IntoIterator<Item = Permission>) {
        self.roles
            .insert(role.to_string(), permissions.into_iter().collect());
        self.logger.debug(&format!("Defined role {role}"), None);
    }

    pub fn assign_role(&self, principal: &str, role: &str) -> Result<(), FoodxError> {
        if !self.roles.contains_key(role) {
            return Err(FoodxError::InvalidInput(format!("unknown role: {role}")));
        }
        self.assignments
            .entry(principal.to_string())
            .or_default()
            .insert(role.to_string());
        Ok(())
    }

    /// Returns whether `principal` held `role`.
    pub fn revoke_role(&self, principal: &str, role: &str) -> bool {
        self.assignments
            .get_mut(principal)
            .is_some_and(|mut roles| roles.remove(role))
    }

    pub fn roles_of(&self, principal: &str) -> Vec<String> {
        let mut roles: Vec<String> = self
            .assignments
            .get(principal)
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default();
        roles.sort();
        roles
    }

    /// Whether any role held by `principal` grants `action` on `resource`.
    pub fn check_permission(&self, principal: &str, action: &str, resource: &str) -> bool {
        let Some(held) = self.assignments.get(principal) else {
            return false;
        };
        held.iter().any(|role| {
            self.roles
                .get(role)
                .is_some_and(|perms| perms.iter().any(|p| p.grants(action, resource)))
        })
    }

    /// Like [`check_permission`](Self::check_permission) but fails with
    /// [`FoodxError::PermissionDenied`]. The decision is audited.
    pub fn require_permission(
        &self,
        principal: &str,
        action: &str,
        resource: &str,
    ) -> Result<(), FoodxError> {
        let allowed = self.check_permission(principal, action, resource);
        let (status, severity) = if allowed {
            (AuditEventStatus::Success, AuditSeverity::Info)
        } else {
            (AuditEventStatus::Blocked, AuditSeverity::Warning)
        };
        self.record(
            NewAuditEntry::new(principal, AuditEventType::Authorization, action, resource, status)
                .with_severity(severity),
        );

        if allowed {
            Ok(())
        } else {
            self.logger.warn(
                &format!("Denied {principal}: {action} on {resource}"),
                None,
            );
            Err(FoodxError::PermissionDenied {
                principal: principal.to_string(),
                action: action.to_string(),
                resource: resource.to_string(),
            })
        }
    }

    /// Append an entry to the audit log and return it as stored.
    pub fn record(&self, entry: NewAuditEntry) -> AuditEntry {
        let stored = AuditEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: self.clock.now_millis(),
            entry,
        };
        self.audit
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stored.clone());
        stored
    }

    pub fn audit_log(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        let log = self.audit.read().unwrap_or_else(PoisonError::into_inner);
        let mut matches: Vec<AuditEntry> =
            log.iter().filter(|e| filter.matches(e)).cloned().collect();
        if let Some(limit) = filter.limit {
            let skip = matches.len().saturating_sub(limit);
            matches.drain(..skip);
        }
        matches
    }
}
