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

//! Roster-driven batch execution.
//!
//! Every row (or row and file, for multi-file transfers) is an independent
//! unit of work. A unit never fails the batch: whatever goes wrong is folded
//! into that unit's result. Units are dispatched in input order through a
//! semaphore-bounded pool; with one permit the batch is strictly sequential.

use futures::future::join_all;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::progress::BatchProgress;
use super::result_types::{ConnectionProbe, OperationResult, RowError, RowErrorKind};
use crate::credentials::Identity;
use crate::roster::{Roster, RosterRow};
use crate::session::{ConnectError, SessionManager};
use crate::share::{RemotePath, ShareLayout};
use crate::utils::fs::{copy_preserving_metadata, format_modified};

/// Per-unit status used for progress display.
pub trait RowStatus {
    fn is_success(&self) -> bool;
    fn status_message(&self) -> String;
}

impl RowStatus for OperationResult {
    fn is_success(&self) -> bool {
        OperationResult::is_success(self)
    }

    fn status_message(&self) -> String {
        match self.error() {
            Some(error) => error.to_string(),
            None => self.outcome().label().to_string(),
        }
    }
}

impl RowStatus for ConnectionProbe {
    fn is_success(&self) -> bool {
        ConnectionProbe::is_success(self)
    }

    fn status_message(&self) -> String {
        self.message.clone()
    }
}

/// Results in dispatch order plus the number of units never started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun<T> {
    pub results: Vec<T>,
    pub skipped: usize,
}

impl<T> BatchRun<T> {
    pub fn was_cancelled(&self) -> bool {
        self.skipped > 0
    }
}

/// Message recorded for a connectivity probe that failed.
pub fn connect_failure_message(error: &ConnectError) -> String {
    if error.is_timeout() {
        error.to_string()
    } else {
        format!("Connection failed: {error}")
    }
}

pub struct BatchExecutor {
    sessions: Arc<SessionManager>,
    layout: ShareLayout,
    max_parallel: usize,
    cancel: CancellationToken,
    progress: BatchProgress,
}

impl BatchExecutor {
    pub fn new(sessions: Arc<SessionManager>, layout: ShareLayout) -> Self {
        Self {
            sessions,
            layout,
            max_parallel: 1,
            cancel: CancellationToken::new(),
            progress: BatchProgress::hidden(),
        }
    }

    /// Number of units processed at once. Zero is treated as one.
    pub fn with_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: BatchProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    async fn dispatch<U, T, F, Fut>(
        &self,
        units: Vec<U>,
        describe: impl Fn(&U) -> String,
        work: F,
    ) -> BatchRun<T>
    where
        F: Fn(U) -> Fut,
        Fut: Future<Output = T>,
        T: RowStatus,
    {
        let total = units.len();
        let semaphore = Semaphore::new(self.max_parallel);

        let tasks = units.into_iter().enumerate().map(|(index, unit)| {
            let semaphore = &semaphore;
            let work = &work;
            let describe = &describe;
            async move {
                let permit = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    permit = semaphore.acquire() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return None;
                };
                if self.cancel.is_cancelled() {
                    return None;
                }

                let label = describe(&unit);
                let pb = self.progress.start(&label, "Working...");
                let result = work(unit).await;
                BatchProgress::finish(&pb, result.is_success(), &result.status_message());
                info!("Processed {}/{}: {}", index + 1, total, label);
                Some(result)
            }
        });

        let outcomes = join_all(tasks).await;
        let skipped = outcomes.iter().filter(|o| o.is_none()).count();
        if skipped > 0 {
            warn!("Batch cancelled; {} of {} unit(s) not started", skipped, total);
        }

        BatchRun {
            results: outcomes.into_iter().flatten().collect(),
            skipped,
        }
    }

    /// Check that `directory\file_name` exists on every roster host.
    pub async fn check_existence(
        &self,
        roster: &Roster,
        identity: Option<&Identity>,
        directory: &str,
        file_name: &str,
    ) -> BatchRun<OperationResult> {
        self.dispatch(
            roster.rows().iter().collect(),
            |row| format!("{} - {}", row.code, row.address),
            |row| self.check_row(row, identity, directory, file_name),
        )
        .await
    }

    async fn check_row(
        &self,
        row: &RosterRow,
        identity: Option<&Identity>,
        directory: &str,
        file_name: &str,
    ) -> OperationResult {
        let raw = RemotePath::raw(&row.address, directory, file_name);
        let fail = |path: String, error: RowError| {
            OperationResult::not_found(&row.code, &row.address, file_name, path, error)
        };

        if identity.is_some() {
            if let Err(e) = self.sessions.connect(&row.address, identity).await {
                return fail(raw, RowError::from(&e));
            }
        }

        let remote = match RemotePath::new(&row.address, directory, file_name) {
            Ok(remote) => remote,
            Err(e) => return fail(raw, RowError::new(RowErrorKind::Connect, e.to_string())),
        };
        let path = remote.to_string();
        let local = self.layout.local_path(&remote);

        match tokio::fs::metadata(&local).await {
            Ok(metadata) => match metadata.modified() {
                Ok(modified) => OperationResult::found(
                    &row.code,
                    &row.address,
                    file_name,
                    path,
                    metadata.len(),
                    format_modified(modified),
                ),
                Err(e) => fail(path, RowError::io(e.to_string())),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => fail(path, RowError::file_not_found()),
            Err(e) => {
                warn!("Error checking {}: {}", path, e);
                fail(path, RowError::io(e.to_string()))
            }
        }
    }

    /// Copy every source file into `directory` on every roster host.
    ///
    /// Results are ordered by file, then by roster row.
    pub async fn transfer(
        &self,
        roster: &Roster,
        identity: Option<&Identity>,
        directory: &str,
        sources: &[PathBuf],
    ) -> BatchRun<OperationResult> {
        let mut units: Vec<(&Path, Option<Arc<String>>, &RosterRow)> = Vec::new();
        for source in sources {
            // A source that cannot be read fails its rows without connecting.
            let unreadable = match tokio::fs::metadata(source).await {
                Ok(metadata) if metadata.is_file() => None,
                Ok(_) => Some(Arc::new(format!("{} is not a file", source.display()))),
                Err(e) => Some(Arc::new(format!(
                    "Cannot read source {}: {}",
                    source.display(),
                    e
                ))),
            };
            if let Some(reason) = &unreadable {
                warn!("{}", reason);
            }
            for row in roster.rows() {
                units.push((source.as_path(), unreadable.clone(), row));
            }
        }

        self.dispatch(
            units,
            |(source, _, row)| {
                format!("{} - {} <- {}", row.code, row.address, source_name(source))
            },
            |(source, unreadable, row)| async move {
                match unreadable {
                    Some(reason) => OperationResult::transfer_failed(
                        &row.code,
                        &row.address,
                        source_name(source),
                        RemotePath::raw(&row.address, directory, &source_name(source)),
                        RowError::io(reason.as_str()),
                    ),
                    None => self.transfer_row(row, identity, directory, source).await,
                }
            },
        )
        .await
    }

    async fn transfer_row(
        &self,
        row: &RosterRow,
        identity: Option<&Identity>,
        directory: &str,
        source: &Path,
    ) -> OperationResult {
        let file_name = source_name(source);
        let raw = RemotePath::raw(&row.address, directory, &file_name);
        let fail = |path: String, error: RowError| {
            OperationResult::transfer_failed(&row.code, &row.address, &file_name, path, error)
        };

        if identity.is_some() {
            if let Err(e) = self.sessions.connect(&row.address, identity).await {
                return fail(raw, RowError::from(&e));
            }
        }

        let remote = match RemotePath::new(&row.address, directory, &file_name) {
            Ok(remote) => remote,
            Err(e) => return fail(raw, RowError::new(RowErrorKind::Connect, e.to_string())),
        };
        let path = remote.to_string();
        let local = self.layout.local_path(&remote);

        if let Some(parent) = local.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!("Error creating {}: {}", remote.parent(), e);
                return fail(path, RowError::io(e.to_string()));
            }
        }

        match copy_preserving_metadata(source, &local).await {
            Ok(bytes) => {
                info!("Transferred {} ({} bytes) to {}", file_name, bytes, path);
                OperationResult::transferred(&row.code, &row.address, &file_name, path)
            }
            Err(e) => {
                warn!("Error transferring to {}: {}", row.address, e);
                fail(path, RowError::io(e.to_string()))
            }
        }
    }

    /// Mount each address once with `identity` and classify the outcome.
    pub async fn test_connections(
        &self,
        addresses: &[String],
        identity: &Identity,
    ) -> BatchRun<ConnectionProbe> {
        self.dispatch(
            addresses.iter().collect(),
            |address| address.to_string(),
            |address| async move {
                match self.sessions.connect(address, Some(identity)).await {
                    Ok(outcome) => ConnectionProbe::succeeded(address, outcome.message()),
                    Err(e) => ConnectionProbe::failed(address, connect_failure_message(&e)),
                }
            },
        )
        .await
    }
}

fn source_name(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string_lossy().into_owned())
}
