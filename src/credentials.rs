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

//! Identities used to authenticate share mounts and the rules that pick one.
//!
//! An explicit username/password pair always wins. When the caller supplies
//! nothing (or only half of a pair) the configured fallback identity is used,
//! provided it is enabled. Otherwise mounts are attempted without credentials.

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use zeroize::Zeroizing;

/// Environment variable consulted for the password of an explicit identity.
pub const PASSWORD_ENV_VAR: &str = "FLEETSHARE_PASSWORD";

/// A username/password pair used for a share mount.
#[derive(Clone)]
pub struct Identity {
    username: String,
    password: SecretString,
}

impl Identity {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            username: username.into(),
            password: SecretString::new(password.into_boxed_str()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Exposes the password for handing to the mount command.
    ///
    /// The returned slice must not be logged or stored.
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    Fallback,
}

/// Outcome of credential resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    Explicit(Identity),
    Fallback(Identity),
    Anonymous,
}

impl Resolution {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Resolution::Explicit(identity) | Resolution::Fallback(identity) => Some(identity),
            Resolution::Anonymous => None,
        }
    }

    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Resolution::Explicit(identity) | Resolution::Fallback(identity) => Some(identity),
            Resolution::Anonymous => None,
        }
    }

    pub fn source(&self) -> Option<CredentialSource> {
        match self {
            Resolution::Explicit(_) => Some(CredentialSource::Explicit),
            Resolution::Fallback(_) => Some(CredentialSource::Fallback),
            Resolution::Anonymous => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback(_))
    }
}

/// Picks the identity for an operation from call-site arguments and the
/// process-wide fallback.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    fallback: Option<Identity>,
    use_fallback: bool,
}

impl CredentialResolver {
    pub fn new(fallback: Option<Identity>, use_fallback: bool) -> Self {
        Self {
            fallback,
            use_fallback,
        }
    }

    /// A resolver that never supplies a fallback identity.
    pub fn without_fallback() -> Self {
        Self::default()
    }

    pub fn fallback_enabled(&self) -> bool {
        self.use_fallback && self.fallback.is_some()
    }

    /// Resolve to an identity, or `None` when mounts should be anonymous.
    pub fn resolve(&self, username: Option<&str>, password: Option<&str>) -> Option<Identity> {
        self.resolve_with_source(username, password).into_identity()
    }

    pub fn resolve_with_source(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Resolution {
        match (non_empty(username), non_empty(password)) {
            (Some(user), Some(pass)) => Resolution::Explicit(Identity::new(user, pass)),
            _ => match &self.fallback {
                Some(identity) if self.use_fallback => {
                    tracing::info!("Using default credentials");
                    Resolution::Fallback(identity.clone())
                }
                _ => Resolution::Anonymous,
            },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Read the password for an explicit identity from [`PASSWORD_ENV_VAR`].
pub fn password_from_env() -> Option<Zeroizing<String>> {
    match std::env::var(PASSWORD_ENV_VAR) {
        Ok(password) if !password.is_empty() => Some(Zeroizing::new(password)),
        _ => None,
    }
}

/// Prompt on the terminal for the password of `username`.
pub fn prompt_password(username: &str) -> Result<Zeroizing<String>> {
    let password = rpassword::prompt_password(format!("Password for {username}: "))
        .map_err(|e| anyhow::anyhow!("Failed to read password: {e}"))?;

    if password.is_empty() {
        anyhow::bail!("Empty password not allowed");
    }

    Ok(Zeroizing::new(password))
}
