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

//! Errors that stop a whole operation before any row is processed.
//!
//! Per-row failures never surface here; they are recorded in the row's
//! [`OperationResult`](crate::executor::OperationResult).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::report::ReportError;
use crate::roster::RosterError;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Roster not found: {}", .0.display())]
    RosterNotFound(PathBuf),

    #[error("Username and password are required")]
    CredentialsRequired,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FleetError {
    /// The roster was read but lacks the expected columns.
    pub fn is_schema(&self) -> bool {
        matches!(self, FleetError::Roster(e) if e.is_schema())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FleetError::RosterNotFound(_) | FleetError::Report(ReportError::NotFound(_))
        )
    }
}

pub type FleetResult<T> = Result<T, FleetError>;
