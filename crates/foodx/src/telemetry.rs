// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console subscriber for hosts that do not install their own.

use foodx_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "FOODX_LOG";

/// Install a global `fmt` subscriber honouring `config`.
///
/// The filter comes from `FOODX_LOG`, then `RUST_LOG`, then
/// `foodx={level},warn`. Returns `false` when console output is disabled or
/// another subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    if !config.console {
        return false;
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(config))
        .with_target(true)
        .with_thread_names(false)
        .try_init()
        .is_ok()
}

fn filter_for(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default_filter(config))
}

fn default_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::new(format!("foodx={},warn", config.level))
}
