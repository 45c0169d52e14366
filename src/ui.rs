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

use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;

use crate::executor::OperationKind;
use crate::report::{ReportError, Summary};
use crate::session::RemoteSession;

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format_header(title: &str) -> String {
        let terminal_width = terminal_width();

        let border = "─".repeat(terminal_width);
        let title_text = format!(" {title} ");
        let title_styled = title_text.cyan().bold().to_string();
        let padding = (terminal_width.saturating_sub(title.width() + 2)) / 2;

        format!(
            "{}\n{}{}\n{}",
            border.dimmed(),
            " ".repeat(padding),
            title_styled,
            border.dimmed()
        )
    }

    pub fn format_batch_header(kind: OperationKind, target: &str, row_count: usize) -> String {
        let verb = match kind {
            OperationKind::Check => "Check results",
            OperationKind::Transfer => "Transfer results",
            OperationKind::ConnectionTest => "Connection results",
        };
        format!(
            "\n{} {} on {} {}:\n{}\n",
            "►".cyan().bold(),
            verb.cyan(),
            row_count.to_string().bold(),
            if row_count == 1 { "host" } else { "hosts" },
            format!("  {target}").dimmed()
        )
    }

    pub fn format_summary(kind: OperationKind, summary: &Summary, skipped: usize) -> String {
        let (ok_label, failed_label) = match kind {
            OperationKind::Check => ("found", "not found"),
            OperationKind::Transfer => ("transferred", "failed"),
            OperationKind::ConnectionTest => ("reachable", "unreachable"),
        };

        let mut parts = vec![format!("{} rows", summary.total.to_string().bold())];

        if summary.ok > 0 {
            parts.push(format!(
                "{} {}",
                summary.ok.to_string().green().bold(),
                ok_label.green()
            ));
        }

        if summary.failed > 0 {
            parts.push(format!(
                "{} {}",
                summary.failed.to_string().red().bold(),
                failed_label.red()
            ));
        }

        if skipped > 0 {
            parts.push(format!(
                "{} {}",
                skipped.to_string().yellow().bold(),
                "skipped".yellow()
            ));
        }

        let rule = "═".repeat(terminal_width());
        format!(
            "\n{}\n{}\n{}\n",
            rule.dimmed(),
            format!(" Summary: {} ", parts.join(" • ")).bold(),
            rule.dimmed()
        )
    }

    pub fn format_report_saved(path: &Path) -> String {
        format!(
            "{} Report saved to {}",
            "✓".green(),
            path.display().to_string().bold()
        )
    }

    /// The saved report path, or why the report could not be written.
    pub fn format_artifact(artifact: &Result<PathBuf, ReportError>) -> String {
        match artifact {
            Ok(path) => Self::format_report_saved(path),
            Err(e) => format!("{} Report not saved: {}", "✗".red(), e.to_string().red()),
        }
    }

    pub fn format_sessions(sessions: &[RemoteSession]) -> String {
        if sessions.is_empty() {
            return format!("{}", "No active sessions".dimmed());
        }

        let host_width = sessions
            .iter()
            .map(|s| s.host.width())
            .max()
            .unwrap_or(0);

        let mut output = format!("{} {}\n", "▶".cyan(), "Active sessions".bold());
        for session in sessions {
            output.push_str(&format!(
                "  {} {}{}  {}  {}\n",
                "●".green(),
                session.host.bold(),
                " ".repeat(host_width.saturating_sub(session.host.width())),
                session.identity,
                session
                    .connected_at
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
                    .dimmed()
            ));
        }
        output
    }
}
