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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main configuration structure.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub mount: MountConfig,
}

/// Global default settings.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Defaults {
    /// Upper bound on each mount attempt, in seconds.
    pub connect_timeout: Option<u64>,
    /// Rows processed at once. 1 keeps batches sequential.
    pub parallel: Option<usize>,
}

/// Fallback identity used when a caller gives no credentials.
#[derive(Serialize, Deserialize, Clone)]
pub struct CredentialsConfig {
    #[serde(default = "default_use_fallback")]
    pub use_fallback: bool,
    #[serde(default)]
    pub username: Option<String>,
    /// May reference environment variables, e.g. `${FLEETSHARE_PASSWORD}`.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            use_fallback: default_use_fallback(),
            username: None,
            password: None,
        }
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("use_fallback", &self.use_fallback)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_use_fallback() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct PathsConfig {
    /// Where roster spreadsheets live.
    pub data_dir: Option<String>,
    /// Where reports are written.
    pub reports_dir: Option<String>,
}

/// How hosts are mounted.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct MountConfig {
    #[serde(default)]
    pub backend: MountBackend,

    /// Hosts are reachable below `<share_root>/<host>` instead of by UNC path.
    #[serde(default)]
    pub share_root: Option<String>,

    /// Argument template for `backend: command`. The first element is the
    /// program.
    #[serde(default)]
    pub mount_command: Vec<String>,

    #[serde(default)]
    pub unmount_command: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MountBackend {
    /// Windows `net use`.
    #[default]
    NetUse,
    /// A configured mount and unmount command.
    Command,
    /// Shares are already mounted; nothing is run.
    None,
}
