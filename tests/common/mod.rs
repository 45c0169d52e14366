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

#![allow(dead_code)]

use async_trait::async_trait;
use fleetshare::credentials::Identity;
use fleetshare::session::{MountDriver, MountOutput};
use rust_xlsxwriter::Workbook;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Mount driver that records calls and fails for selected hosts.
#[derive(Default)]
pub struct RecordingDriver {
    failing: HashSet<String>,
    delay: Option<Duration>,
    mounts: Mutex<Vec<(String, Option<String>)>>,
    unmounts: Mutex<Vec<String>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail mounts of `address` (bare or canonical form).
    pub fn failing(mut self, address: &str) -> Self {
        self.failing
            .insert(address.trim_start_matches('\\').to_string());
        self
    }

    /// Sleep this long inside every mount.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn mount_count(&self) -> usize {
        self.mounts.lock().unwrap().len()
    }

    pub fn mounts_of(&self, address: &str) -> usize {
        let host = format!(r"\\{}", address.trim_start_matches('\\'));
        self.mounts
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| *h == host)
            .count()
    }

    pub fn mounted_users(&self) -> Vec<Option<String>> {
        self.mounts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, user)| user.clone())
            .collect()
    }

    pub fn unmount_count(&self) -> usize {
        self.unmounts.lock().unwrap().len()
    }
}

#[async_trait]
impl MountDriver for RecordingDriver {
    async fn mount(&self, host: &str, identity: Option<&Identity>) -> io::Result<MountOutput> {
        self.mounts.lock().unwrap().push((
            host.to_string(),
            identity.map(|i| i.username().to_string()),
        ));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(host.trim_start_matches('\\')) {
            return Ok(MountOutput::failed("System error 53 has occurred."));
        }
        Ok(MountOutput::ok())
    }

    async fn unmount(&self, host: &str) -> io::Result<MountOutput> {
        self.unmounts.lock().unwrap().push(host.to_string());
        Ok(MountOutput::ok())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn identity() -> Identity {
    Identity::new(r"CORP\ops", "s3cret")
}

/// Write a one-sheet workbook with `header` and `rows`.
pub fn write_workbook<R, S>(path: &Path, header: &[&str], rows: &[R])
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.as_ref().iter().enumerate() {
            let value = value.as_ref();
            if !value.is_empty() {
                sheet
                    .write_string((r + 1) as u32, col as u16, value)
                    .unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

/// A `CodeMag`/`ipaddress` roster in `dir`.
pub fn write_roster(dir: &Path, name: &str, rows: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let rows: Vec<[&str; 2]> = rows.iter().map(|(code, addr)| [*code, *addr]).collect();
    write_workbook(&path, &["CodeMag", "ipaddress"], &rows);
    path
}

/// Create `root/<host>/<dir...>/<file>` with `len` bytes and an mtime.
pub fn seed_remote_file(
    root: &Path,
    host: &str,
    dir: &[&str],
    file: &str,
    len: usize,
    modified: std::time::SystemTime,
) -> PathBuf {
    let mut path = root.join(host);
    for part in dir {
        path.push(part);
    }
    std::fs::create_dir_all(&path).unwrap();
    path.push(file);
    std::fs::write(&path, vec![b'x'; len]).unwrap();
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(modified).unwrap();
    path
}
