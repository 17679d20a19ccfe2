// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the FoodX SDK.
//!
//! TOML files are merged along the XDG hierarchy, overridden by `FOODX_*`
//! environment variables, rejected on unknown keys and validated after
//! deserialization. Failures come back as miette diagnostics with typo
//! suggestions.
//!
//! ```no_run
//! use foodx_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("tenant: {}", config.client.tenant);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    BlockchainConfig, ClientConfig, ConflictResolution, FoodxConfig, LoggingConfig,
    OfflineConfig, StorageBackendKind, StorageConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<FoodxConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from an inline TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<FoodxConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read the TOML files that exist so diagnostics can point into them.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from("/etc/foodx/foodx.toml")];
    candidates.extend(loader::user_config_path());
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join("foodx.toml"))
            .unwrap_or_else(|_| "foodx.toml".into()),
    );

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
