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

use crate::operations::Fleet;

pub fn list_rosters(fleet: &Fleet) -> Result<()> {
    let rosters = fleet.list_rosters()?;

    if rosters.is_empty() {
        println!(
            "{} {}",
            "No roster spreadsheets in".dimmed(),
            fleet.data_dir().display().to_string().dimmed()
        );
        return Ok(());
    }

    println!(
        "\n{} {} {}\n",
        "▶".cyan(),
        "Rosters in".bold(),
        fleet.data_dir().display().to_string().bold()
    );
    for path in &rosters {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        println!("  {} {}", "●".blue(), name);
    }
    println!();
    Ok(())
}
