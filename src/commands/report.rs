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

use crate::operations::Fleet;

pub fn list_reports(fleet: &Fleet) -> Result<()> {
    let reports = fleet.list_reports()?;
    if reports.is_empty() {
        println!(
            "{} {}",
            "No reports in".dimmed(),
            fleet.reports().dir().display().to_string().dimmed()
        );
        return Ok(());
    }

    for path in &reports {
        if let Some(name) = path.file_name() {
            println!("  {} {}", "●".blue(), name.to_string_lossy());
        }
    }
    Ok(())
}

/// Print the location of a report, copying it to `output` when given.
///
/// An existing directory as `output` receives the report under its own name.
pub async fn locate_report(fleet: &Fleet, name: &str, output: Option<&Path>) -> Result<PathBuf> {
    let path = fleet.find_report(name)?;

    let Some(output) = output else {
        println!("{}", path.display());
        return Ok(path);
    };

    let destination = if output.is_dir() {
        output.join(name)
    } else {
        output.to_path_buf()
    };

    tokio::fs::copy(&path, &destination)
        .await
        .with_context(|| format!("Failed to copy report to {}", destination.display()))?;

    println!(
        "{} Copied {} to {}",
        "✓".green(),
        name.bold(),
        destination.display().to_string().bold()
    );
    Ok(destination)
}
