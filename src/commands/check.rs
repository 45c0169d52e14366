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
use std::path::Path;

use super::CallerCredentials;
use crate::operations::Fleet;
use crate::ui::OutputFormatter;

pub async fn check_file(
    fleet: &Fleet,
    credentials: &CallerCredentials,
    roster: &Path,
    file_name: &str,
    directory: &str,
) -> Result<bool> {
    let output = fleet
        .check_existence(
            roster,
            file_name,
            directory,
            credentials.user(),
            credentials.password(),
        )
        .await?;

    let report = &output.report;
    println!(
        "{}",
        OutputFormatter::format_batch_header(
            report.kind(),
            &format!("{directory}\\{file_name}"),
            report.rows().len()
        )
    );
    for row in report.rows() {
        row.print_summary();
    }

    let summary = report.summary();
    println!(
        "{}",
        OutputFormatter::format_summary(report.kind(), &summary, report.skipped())
    );
    println!("{}", OutputFormatter::format_artifact(&output.artifact));

    Ok(summary.has_failures() || report.skipped() > 0 || output.artifact.is_err())
}
