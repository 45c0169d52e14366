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

//! Caller-facing operations.
//!
//! [`Fleet`] ties credential resolution, the session table, the batch
//! executor and report persistence together. One `Fleet` owns one session
//! table for its whole lifetime, so sessions opened by one operation are
//! reused by the next.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::credentials::{CredentialResolver, Identity};
use crate::error::{FleetError, FleetResult};
use crate::executor::{
    connect_failure_message, BatchExecutor, BatchProgress, ConnectionProbe, OperationKind,
    OperationResult,
};
use crate::report::{BatchReport, ReportError, ReportWriter, Tabular};
use crate::roster::{self, Roster};
use crate::session::{RemoteSession, SessionManager};
use crate::share::ShareLayout;

/// A finished batch and the report file written for it.
///
/// Failing to write the file never discards the rows.
#[derive(Debug)]
pub struct BatchOutput<R> {
    pub report: BatchReport<R>,
    pub artifact: Result<PathBuf, ReportError>,
}

/// Result of probing a single address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTest {
    pub address: String,
    pub success: bool,
    pub message: String,
    /// The configured fallback identity was used instead of caller input.
    pub used_fallback: bool,
    pub username: Option<String>,
}

pub struct Fleet {
    resolver: CredentialResolver,
    sessions: Arc<SessionManager>,
    layout: ShareLayout,
    reports: ReportWriter,
    data_dir: PathBuf,
    parallel: usize,
    progress: BatchProgress,
    cancel: Mutex<CancellationToken>,
}

impl Fleet {
    pub fn new(
        resolver: CredentialResolver,
        sessions: Arc<SessionManager>,
        layout: ShareLayout,
        reports: ReportWriter,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            sessions,
            layout,
            reports,
            data_dir: data_dir.into(),
            parallel: 1,
            progress: BatchProgress::hidden(),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Build everything from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let driver = config
            .mount_driver()
            .context("Failed to set up mount backend")?;
        let sessions = Arc::new(SessionManager::with_timeout(
            driver,
            config.connect_timeout(),
        ));

        Ok(Self::new(
            CredentialResolver::new(config.fallback_identity(), config.use_fallback()),
            sessions,
            config.share_layout(),
            ReportWriter::new(config.reports_dir()),
            config.data_dir(),
        )
        .with_parallel(config.parallel()))
    }

    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    pub fn with_progress(mut self, progress: BatchProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_resolver(mut self, resolver: CredentialResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn reports(&self) -> &ReportWriter {
        &self.reports
    }

    fn begin_batch(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut current) = self.cancel.lock() {
            *current = token.clone();
        }
        token
    }

    /// Stop dispatching rows of the batch in progress, if any.
    ///
    /// Returns false when that batch had already been cancelled. Every new
    /// batch starts with a fresh token.
    pub fn cancel_current(&self) -> bool {
        match self.cancel.lock() {
            Ok(current) => {
                let first = !current.is_cancelled();
                current.cancel();
                first
            }
            Err(_) => false,
        }
    }

    fn executor(&self) -> BatchExecutor {
        BatchExecutor::new(Arc::clone(&self.sessions), self.layout.clone())
            .with_parallel(self.parallel)
            .with_progress(self.progress.clone())
            .with_cancellation(self.begin_batch())
    }

    /// A roster path as given, or relative to the data directory.
    pub fn resolve_roster(&self, roster: &Path) -> FleetResult<PathBuf> {
        if roster.as_os_str().is_empty() {
            return Err(FleetError::MissingField("roster"));
        }
        if roster.is_file() {
            return Ok(roster.to_path_buf());
        }
        let in_data_dir = self.data_dir.join(roster);
        if in_data_dir.is_file() {
            return Ok(in_data_dir);
        }
        Err(FleetError::RosterNotFound(roster.to_path_buf()))
    }

    pub fn list_rosters(&self) -> FleetResult<Vec<PathBuf>> {
        Ok(roster::list_roster_files(&self.data_dir)?)
    }

    fn persist<R: Tabular>(&self, report: BatchReport<R>) -> FleetResult<BatchOutput<R>> {
        let artifact = self.reports.write(&report);
        if let Err(e) = &artifact {
            warn!("Could not save {} report: {}", report.kind(), e);
        }
        let summary = report.summary();
        info!(
            "{} batch finished: {} total, {} ok, {} failed",
            report.kind(),
            summary.total,
            summary.ok,
            summary.failed
        );
        Ok(BatchOutput { report, artifact })
    }

    /// Check that `directory\file_name` exists on every roster host.
    pub async fn check_existence(
        &self,
        roster: &Path,
        file_name: &str,
        directory: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> FleetResult<BatchOutput<OperationResult>> {
        if file_name.trim().is_empty() {
            return Err(FleetError::MissingField("filename"));
        }
        if directory.trim().is_empty() {
            return Err(FleetError::MissingField("directory"));
        }

        let roster = Roster::load(&self.resolve_roster(roster)?)?;
        let identity = self.resolver.resolve(username, password);

        let run = self
            .executor()
            .check_existence(&roster, identity.as_ref(), directory, file_name.trim())
            .await;
        self.persist(BatchReport::new(
            OperationKind::Check,
            run.results,
            run.skipped,
        ))
    }

    pub async fn transfer_one(
        &self,
        roster: &Path,
        source: &Path,
        directory: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> FleetResult<BatchOutput<OperationResult>> {
        self.transfer_many(
            roster,
            &[source.to_path_buf()],
            directory,
            username,
            password,
        )
        .await
    }

    /// Copy every source into `directory` on every roster host.
    pub async fn transfer_many(
        &self,
        roster: &Path,
        sources: &[PathBuf],
        directory: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> FleetResult<BatchOutput<OperationResult>> {
        if sources.is_empty() {
            return Err(FleetError::MissingField("files"));
        }
        if sources.iter().any(|s| s.file_name().is_none()) {
            return Err(FleetError::MissingField("file name"));
        }
        if directory.trim().is_empty() {
            return Err(FleetError::MissingField("directory"));
        }

        let roster = Roster::load(&self.resolve_roster(roster)?)?;
        let identity = self.resolver.resolve(username, password);

        let run = self
            .executor()
            .transfer(&roster, identity.as_ref(), directory, sources)
            .await;
        self.persist(BatchReport::new(
            OperationKind::Transfer,
            run.results,
            run.skipped,
        ))
    }

    /// Mount one address, with the fallback identity when none is given.
    pub async fn test_one_connection(
        &self,
        address: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> FleetResult<ConnectionTest> {
        if address.trim().is_empty() {
            return Err(FleetError::MissingField("address"));
        }

        let resolution = self.resolver.resolve_with_source(username, password);
        let used_fallback = resolution.is_fallback();
        let identity = resolution.into_identity();

        let (success, message) = match self.sessions.connect(address, identity.as_ref()).await {
            Ok(outcome) => (true, outcome.message().to_string()),
            Err(e) => (false, connect_failure_message(&e)),
        };

        Ok(ConnectionTest {
            address: address.trim().to_string(),
            success,
            message,
            used_fallback,
            username: identity.map(|i| i.username().to_string()),
        })
    }

    /// Probe every unique address in a roster with one explicit identity.
    ///
    /// The fallback identity is never used here.
    pub async fn test_bulk_connections(
        &self,
        roster: &Path,
        username: Option<&str>,
        password: Option<&str>,
    ) -> FleetResult<BatchOutput<ConnectionProbe>> {
        let identity = match (
            username.map(str::trim).filter(|u| !u.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) {
            (Some(user), Some(pass)) => Identity::new(user, pass),
            _ => return Err(FleetError::CredentialsRequired),
        };

        let (column, addresses) = roster::load_addresses(&self.resolve_roster(roster)?)?;
        info!(
            "Found {} address(es) to test in column {:?}",
            addresses.len(),
            column.name
        );

        let run = self
            .executor()
            .test_connections(&addresses, &identity)
            .await;
        self.persist(BatchReport::new(
            OperationKind::ConnectionTest,
            run.results,
            run.skipped,
        ))
    }

    /// Tear down every session. Returns how many were removed.
    pub async fn disconnect_all(&self) -> usize {
        let removed = self.sessions.disconnect_all().await;
        if removed > 0 {
            info!("Disconnected {} session(s)", removed);
        } else {
            info!("No active sessions to disconnect");
        }
        removed
    }

    pub async fn list_active_connections(&self) -> Vec<RemoteSession> {
        self.sessions.list_active().await
    }

    pub fn find_report(&self, name: &str) -> FleetResult<PathBuf> {
        Ok(self.reports.find(name)?)
    }

    pub fn list_reports(&self) -> FleetResult<Vec<PathBuf>> {
        Ok(self.reports.list()?)
    }
}
