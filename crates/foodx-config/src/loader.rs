// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Supports XDG hierarchy: `./foodx.toml` > `~/.config/foodx/foodx.toml` > `/etc/foodx/foodx.toml`
//! with environment variable overrides via the `FOODX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FoodxConfig;

/// Top-level sections an environment variable may address.
const SECTIONS: &[&str] = &["client", "offline", "storage", "logging", "blockchain"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/foodx/foodx.toml`
/// 3. `~/.config/foodx/foodx.toml`
/// 4. `./foodx.toml`
/// 5. `FOODX_*` environment variables
pub fn load_config() -> Result<FoodxConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string on top of the defaults.
pub fn load_config_from_str(toml_content: &str) -> Result<FoodxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FoodxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FoodxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FoodxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FoodxConfig::default()))
        .merge(Toml::file("/etc/foodx/foodx.toml"))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file("foodx.toml"))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("foodx/foodx.toml"))
}

/// Environment provider mapping `FOODX_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the leading section name is split off, so `FOODX_OFFLINE_MAX_STORAGE_SIZE`
/// lands on `offline.max_storage_size` rather than being split at every underscore.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("FOODX_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
