// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Component logger handed to every service at construction.
//!
//! A [`Logger`] carries a context name and a minimum level. It never blocks
//! and never fails: entries below the threshold are dropped, everything else
//! is forwarded to `tracing` with the context attached as a field. Which
//! subscriber (if any) receives the events is decided by the host process.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Severity levels, ordered from most to least verbose.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Cheap, clonable logging handle scoped to one component.
#[derive(Debug, Clone)]
pub struct Logger {
    context: Arc<str>,
    min_level: LogLevel,
    enabled: bool,
}

impl Logger {
    /// Create a logger for `context` that emits entries at `min_level` and above.
    pub fn new(context: impl AsRef<str>, min_level: LogLevel) -> Self {
        Self {
            context: Arc::from(context.as_ref()),
            min_level,
            enabled: true,
        }
    }

    /// A logger that drops everything.
    pub fn disabled(context: impl AsRef<str>) -> Self {
        Self {
            enabled: false,
            ..Self::new(context, LogLevel::Error)
        }
    }

    /// Derive a logger for a sub-component, e.g. `FoodxClient.OfflineService`.
    pub fn child(&self, name: &str) -> Self {
        Self {
            context: Arc::from(format!("{}.{name}", self.context)),
            min_level: self.min_level,
            enabled: self.enabled,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Whether an entry at `level` would be emitted.
    pub fn enabled_for(&self, level: LogLevel) -> bool {
        self.enabled && level >= self.min_level
    }

    pub fn debug(&self, message: &str, data: Option<&Value>) {
        self.log(LogLevel::Debug, message, data, None);
    }

    pub fn info(&self, message: &str, data: Option<&Value>) {
        self.log(LogLevel::Info, message, data, None);
    }

    pub fn warn(&self, message: &str, data: Option<&Value>) {
        self.log(LogLevel::Warn, message, data, None);
    }

    pub fn error(&self, message: &str, error: Option<&dyn fmt::Display>, data: Option<&Value>) {
        self.log(LogLevel::Error, message, data, error);
    }

    fn log(
        &self,
        level: LogLevel,
        message: &str,
        data: Option<&Value>,
        error: Option<&dyn fmt::Display>,
    ) {
        if !self.enabled_for(level) {
            return;
        }

        let context = &*self.context;
        let data = data.map(|d| d.to_string()).unwrap_or_default();
        let error = error.map(|e| e.to_string()).unwrap_or_default();

        // tracing levels must be known at compile time.
        match level {
            LogLevel::Trace => tracing::trace!(context, data, "{message}"),
            LogLevel::Debug => tracing::debug!(context, data, "{message}"),
            LogLevel::Info => tracing::info!(context, data, "{message}"),
            LogLevel::Warn => tracing::warn!(context, data, "{message}"),
            LogLevel::Error => tracing::error!(context, data, error, "{message}"),
        }
    }
}
