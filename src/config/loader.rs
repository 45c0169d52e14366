// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

//! Configuration loading and priority management.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::types::Config;
use super::utils::expand_tilde;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "fleetshare.yaml";

/// `~/.config/fleetshare/config.yaml` or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fleetshare").map(|dirs| dirs.config_dir().join("config.yaml"))
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context(
            "Failed to parse YAML configuration. Please check the YAML syntax is valid.\n\
             Common issues:\n  \
             - Incorrect indentation (use spaces, not tabs)\n  \
             - Missing colons after keys\n  \
             - Unquoted backslashes in Windows user names",
        )
    }

    /// Load configuration from a file.
    pub async fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_tilde(path);

        let content = fs::read_to_string(&expanded_path).await.with_context(|| {
            format!(
                "Failed to read configuration file at {}. Please check file permissions and ensure the file is accessible.",
                expanded_path.display()
            )
        })?;

        Self::from_yaml(&content)
            .with_context(|| format!("Invalid configuration in {}", expanded_path.display()))
    }

    /// Load configuration with priority order:
    /// 1. Explicit --config path, which must exist
    /// 2. `fleetshare.yaml` in the current directory
    /// 3. The user configuration directory
    /// 4. Built-in defaults
    pub async fn load_with_priority(cli_config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_config_path {
            let expanded = expand_tilde(path);
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            tracing::debug!("Using explicitly specified config file: {:?}", expanded);
            return Self::load(&expanded).await;
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            tracing::debug!("Found {} in current directory", LOCAL_CONFIG_FILE);
            return Self::load(&local).await;
        }

        if let Some(user_config) = user_config_path() {
            tracing::debug!("Checking user config path: {:?}", user_config);
            if user_config.exists() {
                return Self::load(&user_config).await;
            }
        }

        tracing::debug!("No config file found, using default configuration");
        Ok(Self::default())
    }
}
