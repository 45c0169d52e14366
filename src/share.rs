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

//! Remote share addressing.
//!
//! Roster addresses are either bare hosts (`10.0.0.5`, `S001`) or already
//! carry the UNC marker (`\\S001`). Everything downstream works with the
//! canonical form, which always starts with the marker.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix that marks a UNC host.
pub const UNC_MARKER: &str = r"\\";

const MAX_ADDRESS_LENGTH: usize = 260;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Empty address not allowed")]
    Empty,

    #[error("Address too long: {0} bytes (max: {MAX_ADDRESS_LENGTH} bytes)")]
    TooLong(usize),

    #[error("Invalid character {character:?} in address: {address}")]
    InvalidCharacter { address: String, character: char },
}

/// Normalize an address to the canonical `\\host` form.
///
/// Surrounding whitespace is trimmed. Addresses that already start with the
/// marker are kept as they are.
pub fn canonical_host(address: &str) -> Result<String, AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }
    if address.len() > MAX_ADDRESS_LENGTH {
        return Err(AddressError::TooLong(address.len()));
    }

    // Mount arguments are passed without a shell, but these never belong in
    // a host name and usually mean a corrupted roster cell.
    if let Some(character) = address
        .chars()
        .find(|c| c.is_control() || c.is_whitespace() || "\"<>|*?;&`".contains(*c))
    {
        return Err(AddressError::InvalidCharacter {
            address: address.to_string(),
            character,
        });
    }

    if address.starts_with(UNC_MARKER) {
        Ok(address.to_string())
    } else {
        Ok(format!("{UNC_MARKER}{address}"))
    }
}

/// Strip the marker from a canonical host.
pub fn bare_host(canonical: &str) -> &str {
    canonical.trim_start_matches('\\')
}

/// A normalized path below a remote host: `\\host\dir\...\file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    host: String,
    segments: Vec<String>,
}

impl RemotePath {
    /// Build `prefix(address)\directory\file`.
    ///
    /// Both separator styles are accepted. Empty and `.` components are
    /// dropped and `..` removes the preceding component, but never the host.
    pub fn new(address: &str, directory: &str, file: &str) -> Result<Self, AddressError> {
        let canonical = canonical_host(address)?;
        let mut parts = split_components(bare_host(&canonical));
        if parts.is_empty() {
            return Err(AddressError::Empty);
        }
        let host = parts.remove(0);

        let mut segments: Vec<String> = Vec::new();
        for part in parts
            .into_iter()
            .chain(split_components(directory))
            .chain(split_components(file))
        {
            match part.as_str() {
                "." => {}
                ".." => {
                    segments.pop();
                }
                _ => segments.push(part),
            }
        }

        Ok(Self { host, segments })
    }

    /// The destination string used when no session could be established.
    ///
    /// Nothing is normalized; the address is used exactly as it appears in
    /// the roster.
    pub fn raw(address: &str, directory: &str, file: &str) -> String {
        format!(r"\\{address}\{directory}\{file}")
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path with its last component removed.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self {
            host: self.host.clone(),
            segments,
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{UNC_MARKER}{}", self.host)?;
        for segment in &self.segments {
            write!(f, "\\{segment}")?;
        }
        Ok(())
    }
}

fn split_components(value: &str) -> Vec<String> {
    value
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// How remote paths map onto the local filesystem once a host is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShareLayout {
    /// UNC paths are opened directly, as on Windows after `net use`.
    #[default]
    Unc,
    /// Each host is mounted at `<root>/<host>`.
    MountRoot(PathBuf),
}

impl ShareLayout {
    pub fn local_path(&self, remote: &RemotePath) -> PathBuf {
        match self {
            ShareLayout::Unc => PathBuf::from(remote.to_string()),
            ShareLayout::MountRoot(root) => {
                let mut path = root.join(remote.host());
                for segment in remote.segments() {
                    path.push(segment);
                }
                path
            }
        }
    }

    pub fn mount_root(&self) -> Option<&Path> {
        match self {
            ShareLayout::Unc => None,
            ShareLayout::MountRoot(root) => Some(root),
        }
    }
}
