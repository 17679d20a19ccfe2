// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin and webhook registries.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use foodx_core::{Clock, FoodxError, Logger, SystemClock, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PluginStatus {
    Active,
    Disabled,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlugin {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub entry_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub id: String,
    #[serde(flatten)]
    pub definition: NewPlugin,
    pub status: PluginStatus,
    pub registered_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebhook {
    pub url: String,
    /// Event names delivered to this hook. Empty subscribes to nothing.
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    pub url: String,
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Partial webhook update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookUpdate {
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub secret: Option<Option<String>>,
    pub active: Option<bool>,
}

pub struct EcosystemService {
    plugins: DashMap<String, Plugin>,
    webhooks: DashMap<String, Webhook>,
    clock: Arc<dyn Clock>,
    logger: Logger,
}

impl EcosystemService {
    pub fn new(logger: Logger) -> Self {
        Self::with_clock(logger, Arc::new(SystemClock))
    }

    pub fn with_clock(logger: Logger, clock: Arc<dyn Clock>) -> Self {
        Self {
            plugins: DashMap::new(),
            webhooks: DashMap::new(),
            clock,
            logger,
        }
    }

    pub async fn initialize(&self) -> Result<(), FoodxError> {
        self.logger.info("Ecosystem service initialized", None);
        Ok(())
    }

    pub fn register_plugin(&self, plugin: NewPlugin) -> Result<Plugin, FoodxError> {
        if plugin.name.trim().is_empty() {
            return Err(FoodxError::InvalidInput("plugin name must not be empty".into()));
        }
        semver::Version::parse(&plugin.version).map_err(|e| {
            FoodxError::InvalidInput(format!("plugin version {:?} is not semver: {e}", plugin.version))
        })?;

        let plugin = Plugin {
            id: uuid::Uuid::new_v4().to_string(),
            definition: plugin,
            status: PluginStatus::Active,
            registered_at: self.clock.now_millis(),
            error: None,
        };
        self.plugins.insert(plugin.id.clone(), plugin.clone());
        self.logger.info(
            &format!("Registered plugin {} {}", plugin.definition.name, plugin.definition.version),
            None,
        );
        Ok(plugin)
    }

    pub fn plugin(&self, id: &str) -> Option<Plugin> {
        self.plugins.get(id).map(|p| p.value().clone())
    }

    /// All plugins, oldest registration first.
    pub fn plugins(&self) -> Vec<Plugin> {
        let mut all: Vec<Plugin> = self.plugins.iter().map(|p| p.value().clone()).collect();
        all.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.definition.name.cmp(&b.definition.name))
        });
        all
    }

    /// Change a plugin's status. `error` is kept only for [`PluginStatus::Error`].
    pub fn set_plugin_status(
        &self,
        id: &str,
        status: PluginStatus,
        error: Option<String>,
    ) -> Result<Plugin, FoodxError> {
        let mut plugin = self
            .plugins
            .get_mut(id)
            .ok_or_else(|| FoodxError::InvalidInput(format!("unknown plugin: {id}")))?;
        plugin.status = status;
        plugin.error = error.filter(|_| status == PluginStatus::Error);
        Ok(plugin.clone())
    }

    pub fn unregister_plugin(&self, id: &str) -> bool {
        let removed = self.plugins.remove(id).is_some();
        if removed {
            self.logger.info(&format!("Unregistered plugin {id}"), None);
        }
        removed
    }

    pub fn create_webhook(&self, webhook: NewWebhook) -> Result<Webhook, FoodxError> {
        validate_url(&webhook.url)?;
        let now = self.clock.now_millis();
        let webhook = Webhook {
            id: uuid::Uuid::new_v4().to_string(),
            url: webhook.url,
            events: webhook.events,
            secret: webhook.secret,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.webhooks.insert(webhook.id.clone(), webhook.clone());
        Ok(webhook)
    }

    pub fn update_webhook(&self, id: &str, update: WebhookUpdate) -> Result<Webhook, FoodxError> {
        if let Some(url) = &update.url {
            validate_url(url)?;
        }
        let mut hook = self
            .webhooks
            .get_mut(id)
            .ok_or_else(|| FoodxError::InvalidInput(format!("unknown webhook: {id}")))?;
        if let Some(url) = update.url {
            hook.url = url;
        }
        if let Some(events) = update.events {
            hook.events = events;
        }
        if let Some(secret) = update.secret {
            hook.secret = secret;
        }
        if let Some(active) = update.active {
            hook.active = active;
        }
        hook.updated_at = self.clock.now_millis();
        Ok(hook.clone())
    }

    pub fn delete_webhook(&self, id: &str) -> bool {
        self.webhooks.remove(id).is_some()
    }

    /// All webhooks, oldest first.
    pub fn webhooks(&self) -> Vec<Webhook> {
        let mut all: Vec<Webhook> = self.webhooks.iter().map(|w| w.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.url.cmp(&b.url)));
        all
    }

    /// Active webhooks subscribed to `event`.
    pub fn webhooks_for(&self, event: &str) -> Vec<Webhook> {
        self.webhooks()
            .into_iter()
            .filter(|w| w.active && w.events.iter().any(|e| e == event))
            .collect()
    }
}

fn validate_url(url: &str) -> Result<(), FoodxError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(FoodxError::InvalidInput(format!(
            "webhook url must be http(s): {url}"
        ))),
    }
}
