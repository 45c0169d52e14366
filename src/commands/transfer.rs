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

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

use super::CallerCredentials;
use crate::operations::Fleet;
use crate::ui::OutputFormatter;
use crate::utils::resolve_all_sources;

pub async fn transfer_files(
    fleet: &Fleet,
    credentials: &CallerCredentials,
    roster: &Path,
    directory: &str,
    patterns: &[PathBuf],
) -> Result<bool> {
    let sources = resolve_all_sources(patterns).context("Failed to resolve source files")?;
    if sources.is_empty() {
        anyhow::bail!("No source files matched");
    }

    println!(
        "{} {} file(s) to transfer:",
        "▶".cyan(),
        sources.len().to_string().bold()
    );
    for source in &sources {
        println!("    {} {}", "•".dimmed(), source.display().to_string().dimmed());
    }

    let output = fleet
        .transfer_many(
            roster,
            &sources,
            directory,
            credentials.user(),
            credentials.password(),
        )
        .await?;

    let report = &output.report;
    println!(
        "{}",
        OutputFormatter::format_batch_header(report.kind(), directory, report.rows().len())
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
