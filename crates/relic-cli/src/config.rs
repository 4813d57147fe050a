// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use relic_sdk::DecodeLimits;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "Relic.toml";

/// Represents the structure of the `Relic.toml` configuration file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct RelicConfig {
    /// Ceilings applied while decoding.
    pub limits: DecodeLimits,
}

/// Loads the configuration from `explicit` when given, else from `Relic.toml`
/// in the working directory. If neither exists, returns the default configuration.
///
/// An explicitly named file that is missing is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<RelicConfig> {
    let config_path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG));
    if explicit.is_none() && !config_path.exists() {
        log::debug!(
            "No '{}' found. Using default configuration.",
            config_path.display()
        );
        return Ok(RelicConfig::default());
    }

    let config_str = fs::read_to_string(config_path).with_context(|| {
        format!(
            "Failed to read config file at '{}'",
            config_path.display()
        )
    })?;
    let config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse TOML from '{}'", config_path.display()))?;
    log::info!("Loaded configuration from '{}'", config_path.display());
    Ok(config)
}
