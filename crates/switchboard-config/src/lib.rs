// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Switchboard carrier adapter.
//!
//! TOML parsing with strict validation (`deny_unknown_fields`), XDG file
//! hierarchy lookup, environment variable overrides (including the carriers'
//! native `TWILIO_*` and `SIGNALWIRE_*` names), and miette diagnostics with
//! typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use switchboard_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{RunMode, SwitchboardConfig};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment errors are converted to diagnostics with source spans; a
/// successful extraction is then run through [`validation::validate_config`].
pub fn load_and_validate() -> Result<SwitchboardConfig, Vec<ConfigError>> {
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

/// Load an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<SwitchboardConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<SwitchboardConfig, Vec<ConfigError>> {
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

/// Contents of every config file that exists, keyed by the path figment reports.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::search_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let display = if path.is_relative() {
                std::env::current_dir()
                    .map(|d| d.join(&path).display().to_string())
                    .unwrap_or_else(|_| path.display().to_string())
            } else {
                path.display().to_string()
            };
            Some((display, content))
        })
        .collect()
}
