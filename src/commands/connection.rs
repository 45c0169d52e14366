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

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

use super::CallerCredentials;
use crate::operations::Fleet;
use crate::ui::OutputFormatter;

pub async fn test_connection(
    fleet: &Fleet,
    credentials: &CallerCredentials,
    address: &str,
) -> Result<bool> {
    let test = fleet
        .test_one_connection(address, credentials.user(), credentials.password())
        .await?;

    let identity = match (&test.username, test.used_fallback) {
        (Some(user), true) => format!("as {user}, fallback identity"),
        (Some(user), false) => format!("as {user}"),
        (None, _) => "without credentials".to_string(),
    };

    if test.success {
        println!(
            "{} {}: {} {}",
            "●".green(),
            test.address.bold(),
            test.message.green(),
            format!("({identity})").dimmed()
        );
    } else {
        println!(
            "{} {}: {} {}",
            "●".red(),
            test.address.bold(),
            test.message.red(),
            format!("({identity})").dimmed()
        );
    }

    Ok(!test.success)
}

pub async fn test_bulk(
    fleet: &Fleet,
    credentials: &CallerCredentials,
    roster: &Path,
) -> Result<bool> {
    let output = fleet
        .test_bulk_connections(roster, credentials.user(), credentials.password())
        .await?;

    let report = &output.report;
    println!(
        "{}",
        OutputFormatter::format_batch_header(
            report.kind(),
            &roster.display().to_string(),
            report.rows().len()
        )
    );
    for probe in report.rows() {
        probe.print_summary();
    }

    let summary = report.summary();
    println!(
        "{}",
        OutputFormatter::format_summary(report.kind(), &summary, report.skipped())
    );
    println!("{}", OutputFormatter::format_artifact(&output.artifact));

    Ok(summary.has_failures() || report.skipped() > 0 || output.artifact.is_err())
}
