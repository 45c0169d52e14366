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

//! Turning configuration values into runtime settings.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::types::{Config, MountBackend};
use super::utils::{expand_env_vars, expand_tilde, has_unexpanded_vars};
use crate::credentials::Identity;
use crate::session::{CommandDriver, MountDriver, NetUseDriver, NoopDriver};
use crate::share::ShareLayout;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_REPORTS_DIR: &str = "reports";

fn expand_path(value: &str) -> PathBuf {
    expand_tilde(&PathBuf::from(expand_env_vars(value)))
}

impl Config {
    /// Mount timeout; zero or unset means 10 seconds.
    pub fn connect_timeout(&self) -> Duration {
        match self.defaults.connect_timeout {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    pub fn parallel(&self) -> usize {
        self.defaults.parallel.unwrap_or(1).max(1)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.paths
            .reports_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR))
    }

    pub fn use_fallback(&self) -> bool {
        self.credentials.use_fallback
    }

    /// The configured fallback identity, once environment references in its
    /// fields have been expanded.
    ///
    /// An identity with an unresolved variable is ignored.
    pub fn fallback_identity(&self) -> Option<Identity> {
        let username = expand_env_vars(self.credentials.username.as_deref()?.trim());
        let password = expand_env_vars(self.credentials.password.as_deref()?);

        if username.is_empty() || password.is_empty() {
            return None;
        }
        if has_unexpanded_vars(&username) || has_unexpanded_vars(&password) {
            tracing::warn!(
                "Fallback credentials for {} reference an unset environment variable; ignoring them",
                username
            );
            return None;
        }
        Some(Identity::new(username, password))
    }

    pub fn share_layout(&self) -> ShareLayout {
        match self.mount.share_root.as_deref() {
            Some(root) if !root.trim().is_empty() => ShareLayout::MountRoot(expand_path(root)),
            _ => ShareLayout::Unc,
        }
    }

    pub fn mount_driver(&self) -> Result<Arc<dyn MountDriver>> {
        let driver: Arc<dyn MountDriver> = match self.mount.backend {
            MountBackend::NetUse => Arc::new(NetUseDriver::new()),
            MountBackend::None => Arc::new(NoopDriver),
            MountBackend::Command => {
                let mut driver = CommandDriver::new(
                    self.mount.mount_command.clone(),
                    self.mount.unmount_command.clone(),
                )
                .map_err(|e| anyhow::anyhow!("Invalid mount.command configuration: {e}"))?;
                if let ShareLayout::MountRoot(root) = self.share_layout() {
                    driver = driver.with_mount_root(root);
                }
                Arc::new(driver)
            }
        };
        tracing::debug!("Using mount backend {}", driver.name());
        Ok(driver)
    }
}
