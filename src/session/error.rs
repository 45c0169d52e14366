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

use std::time::Duration;
use thiserror::Error;

use crate::share::AddressError;

/// Why a session could not be established.
///
/// `Display` yields only the diagnostic text so callers can add their own
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error(transparent)]
    InvalidHost(#[from] AddressError),

    /// The mount command ran and reported failure.
    #[error("{message}")]
    Mount { host: String, message: String },

    #[error("Connection timed out")]
    Timeout { host: String, after: Duration },

    /// The mount command could not be started at all.
    #[error("Failed to run mount command: {message}")]
    Spawn { host: String, message: String },
}

impl ConnectError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnectError::Timeout { .. })
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            ConnectError::InvalidHost(_) => None,
            ConnectError::Mount { host, .. }
            | ConnectError::Timeout { host, .. }
            | ConnectError::Spawn { host, .. } => Some(host),
        }
    }
}
