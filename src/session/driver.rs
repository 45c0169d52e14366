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

//! Mount primitives.
//!
//! A [`MountDriver`] knows how to attach and detach one canonical host using
//! the operating system's own remote-filesystem facility. Commands are always
//! spawned with an explicit argument vector; nothing goes through a shell.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::credentials::Identity;
use crate::share::bare_host;

const REDACTED: &str = "[REDACTED]";

/// Captured result of one mount or unmount invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl MountOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(1),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// Best human-readable explanation of a failure.
    pub fn diagnostic(&self) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else if !self.stdout.is_empty() {
            self.stdout.clone()
        } else {
            match self.code {
                Some(code) => format!("Mount command exited with status {code}"),
                None => "Mount command terminated by signal".to_string(),
            }
        }
    }
}

#[async_trait]
pub trait MountDriver: Send + Sync {
    /// Attach `host` (canonical form), authenticating with `identity` when
    /// one is given.
    async fn mount(&self, host: &str, identity: Option<&Identity>) -> io::Result<MountOutput>;

    /// Detach `host`. Callers treat failures as non-fatal.
    async fn unmount(&self, host: &str) -> io::Result<MountOutput>;

    fn name(&self) -> &'static str;
}

async fn run_command(program: &str, args: &[String], shown: &[String]) -> io::Result<MountOutput> {
    debug!("Running {} {}", program, shown.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    Ok(MountOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Windows `net use`.
#[derive(Debug, Clone)]
pub struct NetUseDriver {
    program: String,
}

impl Default for NetUseDriver {
    fn default() -> Self {
        Self {
            program: "net".to_string(),
        }
    }
}

impl NetUseDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argument vector for a mount, with the password in clear.
    pub fn mount_args(host: &str, identity: Option<&Identity>) -> Vec<String> {
        let mut args = vec!["use".to_string(), host.to_string()];
        if let Some(identity) = identity {
            args.push(format!("/user:{}", identity.username()));
            args.push(identity.expose_password().to_string());
        }
        args
    }

    pub fn unmount_args(host: &str) -> Vec<String> {
        vec![
            "use".to_string(),
            host.to_string(),
            "/delete".to_string(),
            "/y".to_string(),
        ]
    }
}

#[async_trait]
impl MountDriver for NetUseDriver {
    async fn mount(&self, host: &str, identity: Option<&Identity>) -> io::Result<MountOutput> {
        let args = Self::mount_args(host, identity);
        let mut shown = args.clone();
        if identity.is_some() {
            if let Some(last) = shown.last_mut() {
                *last = REDACTED.to_string();
            }
        }
        run_command(&self.program, &args, &shown).await
    }

    async fn unmount(&self, host: &str) -> io::Result<MountOutput> {
        let args = Self::unmount_args(host);
        run_command(&self.program, &args, &args).await
    }

    fn name(&self) -> &'static str {
        "net-use"
    }
}

/// A mount command assembled from argument templates.
///
/// Each template element becomes exactly one argument. The placeholders
/// `{share}`, `{host}`, `{mount_point}`, `{user}` and `{password}` are
/// substituted inside an element. Elements referring to `{user}` or
/// `{password}` are left out when mounting without an identity.
#[derive(Debug, Clone)]
pub struct CommandDriver {
    mount: Vec<String>,
    unmount: Vec<String>,
    mount_root: Option<PathBuf>,
}

/// One rendered argument, flagged when it carries the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArg {
    pub value: String,
    pub sensitive: bool,
}

impl CommandDriver {
    pub fn new(mount: Vec<String>, unmount: Vec<String>) -> io::Result<Self> {
        if mount.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "mount command template is empty",
            ));
        }
        if unmount.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unmount command template is empty",
            ));
        }
        Ok(Self {
            mount,
            unmount,
            mount_root: None,
        })
    }

    /// Hosts are mounted at `<root>/<host>`; exposes `{mount_point}`.
    pub fn with_mount_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.mount_root = Some(root.into());
        self
    }

    fn mount_point(&self, host: &str) -> Option<PathBuf> {
        self.mount_root
            .as_ref()
            .map(|root| root.join(bare_host(host).replace('\\', "/")))
    }

    pub fn render(
        &self,
        template: &[String],
        host: &str,
        identity: Option<&Identity>,
    ) -> Vec<RenderedArg> {
        let mount_point = self
            .mount_point(host)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        template
            .iter()
            .filter_map(|element| {
                let needs_identity = element.contains("{user}") || element.contains("{password}");
                if needs_identity && identity.is_none() {
                    return None;
                }

                let mut value = element
                    .replace("{share}", host)
                    .replace("{host}", bare_host(host))
                    .replace("{mount_point}", &mount_point);
                let mut sensitive = false;
                if let Some(identity) = identity {
                    value = value.replace("{user}", identity.username());
                    if value.contains("{password}") {
                        value = value.replace("{password}", identity.expose_password());
                        sensitive = true;
                    }
                }
                Some(RenderedArg { value, sensitive })
            })
            .collect()
    }

    async fn run(&self, rendered: Vec<RenderedArg>) -> io::Result<MountOutput> {
        let mut values = rendered.iter().map(|a| a.value.clone());
        let program = values.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "command template is empty")
        })?;
        let args: Vec<String> = values.collect();
        let shown: Vec<String> = rendered
            .iter()
            .skip(1)
            .map(|a| {
                if a.sensitive {
                    REDACTED.to_string()
                } else {
                    a.value.clone()
                }
            })
            .collect();
        run_command(&program, &args, &shown).await
    }
}

#[async_trait]
impl MountDriver for CommandDriver {
    async fn mount(&self, host: &str, identity: Option<&Identity>) -> io::Result<MountOutput> {
        if let Some(mount_point) = self.mount_point(host) {
            tokio::fs::create_dir_all(&mount_point).await?;
        }
        let rendered = self.render(&self.mount, host, identity);
        self.run(rendered).await
    }

    async fn unmount(&self, host: &str) -> io::Result<MountOutput> {
        let rendered = self.render(&self.unmount, host, None);
        self.run(rendered).await
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// For shares the operating system already has mounted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDriver;

#[async_trait]
impl MountDriver for NoopDriver {
    async fn mount(&self, _host: &str, _identity: Option<&Identity>) -> io::Result<MountOutput> {
        Ok(MountOutput::ok())
    }

    async fn unmount(&self, _host: &str) -> io::Result<MountOutput> {
        Ok(MountOutput::ok())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
