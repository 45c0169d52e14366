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

//! Subcommand handlers.
//!
//! Each handler prints its results and returns `Ok(true)` when the batch
//! contained failures, so the caller can pick the exit code.

pub mod check;
pub mod connection;
pub mod report;
pub mod rosters;
pub mod sessions;
pub mod shell;
pub mod transfer;

use anyhow::Result;
use std::fmt;
use zeroize::Zeroizing;

use crate::cli::Commands;
use crate::operations::Fleet;

/// Username and password given on the command line or in the console.
#[derive(Clone, Default)]
pub struct CallerCredentials {
    user: Option<String>,
    password: Option<Zeroizing<String>>,
}

impl CallerCredentials {
    pub fn new(user: Option<String>, password: Option<Zeroizing<String>>) -> Self {
        Self { user, password }
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }
}

impl fmt::Debug for CallerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerCredentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Honour `--disconnect` whether or not the batch succeeded.
async fn finish_batch(fleet: &Fleet, disconnect: bool, result: Result<bool>) -> Result<bool> {
    if disconnect {
        sessions::disconnect_all(fleet).await;
    }
    result
}

/// Run one subcommand against `fleet`.
///
/// `Shell` is not handled here; the console calls back into this function.
pub async fn dispatch(
    fleet: &Fleet,
    credentials: &CallerCredentials,
    command: &Commands,
) -> Result<bool> {
    match command {
        Commands::Check {
            roster,
            file,
            dir,
            disconnect,
        } => {
            let result = check::check_file(fleet, credentials, roster, file, dir).await;
            finish_batch(fleet, *disconnect, result).await
        }
        Commands::Transfer {
            roster,
            dir,
            files,
            disconnect,
        } => {
            let result = transfer::transfer_files(fleet, credentials, roster, dir, files).await;
            finish_batch(fleet, *disconnect, result).await
        }
        Commands::TestConnection { address } => {
            connection::test_connection(fleet, credentials, address).await
        }
        Commands::TestBulk { roster, disconnect } => {
            let result = connection::test_bulk(fleet, credentials, roster).await;
            finish_batch(fleet, *disconnect, result).await
        }
        Commands::Rosters => {
            rosters::list_rosters(fleet)?;
            Ok(false)
        }
        Commands::Report { name, output } => {
            match name {
                Some(name) => {
                    report::locate_report(fleet, name, output.as_deref()).await?;
                }
                None => report::list_reports(fleet)?,
            }
            Ok(false)
        }
        Commands::Shell => anyhow::bail!("The console is already running"),
    }
}
