// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Online services of the FoodX SDK.
//!
//! - [`BlockchainService`] routes ledger calls to the configured network adapter
//! - [`EnterpriseService`] holds roles, permission checks and the audit trail
//! - [`ComplianceService`] exports records as JSON or CSV
//! - [`EcosystemService`] keeps the plugin and webhook registries
//!
//! The network adapters are local stand-ins that keep an in-memory ledger.

pub mod adapters;
pub mod blockchain;
pub mod compliance;
pub mod ecosystem;
pub mod enterprise;

pub use adapters::{EthereumAdapter, FabricAdapter};
pub use blockchain::BlockchainService;
pub use compliance::{ComplianceService, ExportFormat};
pub use ecosystem::{
    EcosystemService, NewPlugin, NewWebhook, Plugin, PluginStatus, Webhook, WebhookUpdate,
};
pub use enterprise::{
    AuditEntry, AuditEventStatus, AuditEventType, AuditFilter, AuditSeverity, EnterpriseService,
    NewAuditEntry, Permission,
};
