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

//! Aggregated batch outcomes and their spreadsheet form.

mod writer;

pub use writer::{report_file_name, ReportError, ReportWriter};

use crate::executor::{ConnectionProbe, OperationKind, OperationResult, RowStatus};

/// A single report cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn optional_text(value: Option<impl Into<String>>) -> Self {
        value.map(|v| Cell::Text(v.into())).unwrap_or(Cell::Empty)
    }

    /// Width the cell occupies when displayed.
    pub fn display_len(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
            Cell::Empty => 0,
        }
    }
}

/// Columns written for each kind of batch.
pub fn columns(kind: OperationKind) -> &'static [&'static str] {
    match kind {
        OperationKind::Check => &[
            "CodeMag",
            "IPAddress",
            "FileName",
            "Exists",
            "FilePath",
            "FileSize",
            "LastModified",
            "Error",
        ],
        OperationKind::Transfer => &[
            "CodeMag",
            "IPAddress",
            "FileName",
            "Status",
            "DestinationPath",
            "Error",
        ],
        OperationKind::ConnectionTest => &["IPAddress", "Status", "Message"],
    }
}

/// A row that can be written to a report.
pub trait Tabular: RowStatus {
    fn cells(&self) -> Vec<Cell>;
}

impl Tabular for OperationResult {
    fn cells(&self) -> Vec<Cell> {
        let error = Cell::optional_text(self.error().map(|e| e.to_string()));
        match self.kind() {
            OperationKind::Check => vec![
                Cell::text(self.code()),
                Cell::text(self.address()),
                Cell::text(self.file_name()),
                Cell::text(self.outcome().label()),
                Cell::text(self.path()),
                self.size()
                    .map(|s| Cell::Number(s as f64))
                    .unwrap_or(Cell::Empty),
                Cell::optional_text(self.modified()),
                error,
            ],
            _ => vec![
                Cell::text(self.code()),
                Cell::text(self.address()),
                Cell::text(self.file_name()),
                Cell::text(self.outcome().label()),
                Cell::text(self.path()),
                error,
            ],
        }
    }
}

impl Tabular for ConnectionProbe {
    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.address),
            Cell::text(self.outcome.label()),
            Cell::text(&self.message),
        ]
    }
}

/// Counts over a batch. `ok` is found or succeeded, `failed` the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_rows<R: RowStatus>(rows: &[R]) -> Self {
        let ok = rows.iter().filter(|r| r.is_success()).count();
        Self {
            total: rows.len(),
            ok,
            failed: rows.len() - ok,
        }
    }

    pub fn found(&self) -> usize {
        self.ok
    }

    pub fn not_found(&self) -> usize {
        self.failed
    }

    pub fn succeeded(&self) -> usize {
        self.ok
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Ordered results of one batch with their summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<R> {
    kind: OperationKind,
    rows: Vec<R>,
    summary: Summary,
    skipped: usize,
}

impl<R: RowStatus> BatchReport<R> {
    pub fn new(kind: OperationKind, rows: Vec<R>, skipped: usize) -> Self {
        let summary = Summary::from_rows(&rows);
        Self {
            kind,
            rows,
            summary,
            skipped,
        }
    }
}

impl<R> BatchReport<R> {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Units never started because the batch was cancelled.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
