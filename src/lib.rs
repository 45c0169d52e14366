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

//! Check and distribute files across a fleet of hosts reached through
//! mounted network shares.
//!
//! A roster spreadsheet lists the hosts. [`operations::Fleet`] mounts each
//! one through a [`session::SessionManager`], runs a check or a transfer per
//! row with [`executor::BatchExecutor`], and writes the outcome as an
//! `.xlsx` report.

pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod operations;
pub mod report;
pub mod roster;
pub mod session;
pub mod share;
pub mod ui;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use error::{FleetError, FleetResult};
pub use operations::Fleet;
