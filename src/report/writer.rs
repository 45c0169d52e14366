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

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::{columns, BatchReport, Cell, Tabular};
use crate::executor::OperationKind;

const MAX_COLUMN_WIDTH: usize = 50;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("Invalid report name: {0}")]
    InvalidName(String),

    #[error("Failed to write report: {0}")]
    Write(#[from] XlsxError),

    #[error("Report I/O error: {0}")]
    Io(#[from] io::Error),
}

fn prefix(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Check => "report",
        OperationKind::Transfer => "transfer_report",
        OperationKind::ConnectionTest => "connection_report",
    }
}

fn sheet_name(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Check => "Results",
        OperationKind::Transfer => "Transfer Results",
        OperationKind::ConnectionTest => "Connection Results",
    }
}

/// `report_20240101_100000.xlsx` and friends.
pub fn report_file_name(kind: OperationKind, at: DateTime<Local>) -> String {
    format!("{}_{}.xlsx", prefix(kind), at.format("%Y%m%d_%H%M%S"))
}

/// Writes reports into, and looks them up from, one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write<R: Tabular>(&self, report: &BatchReport<R>) -> Result<PathBuf, ReportError> {
        self.write_at(report, Local::now())
    }

    /// Write `report` named after `at`. An existing file of the same name is
    /// left alone and a numeric suffix is added instead.
    pub fn write_at<R: Tabular>(
        &self,
        report: &BatchReport<R>,
        at: DateTime<Local>,
    ) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.dir)?;

        let name = report_file_name(report.kind(), at);
        let mut path = self.dir.join(&name);
        let stem = name.trim_end_matches(".xlsx").to_string();
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{stem}_{n}.xlsx"));
            n += 1;
        }

        let headers = columns(report.kind());
        let rows: Vec<Vec<Cell>> = report.rows().iter().map(|r| r.cells()).collect();

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(report.kind()))?;

        let bold = Format::new().set_bold();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }

        for (i, cells) in rows.iter().enumerate() {
            let row = (i + 1) as u32;
            for (col, cell) in cells.iter().enumerate() {
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row, col as u16, text)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row, col as u16, *n)?;
                    }
                    Cell::Empty => {}
                }
                if let Some(width) = widths.get_mut(col) {
                    *width = (*width).max(cell.display_len());
                }
            }
        }

        for (col, width) in widths.iter().enumerate() {
            let width = (width + 2).min(MAX_COLUMN_WIDTH);
            worksheet.set_column_width(col as u16, width as f64)?;
        }

        workbook.save(&path)?;
        info!("Report written to {:?}", path);
        Ok(path)
    }

    /// Locate a previously written report by file name.
    pub fn find(&self, name: &str) -> Result<PathBuf, ReportError> {
        let name = name.trim();
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name == "."
            || name == ".."
            || name.contains('\0')
        {
            return Err(ReportError::InvalidName(name.to_string()));
        }

        let path = self.dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ReportError::NotFound(name.to_string()))
        }
    }

    /// Report files in the directory, newest name first.
    pub fn list(&self) -> Result<Vec<PathBuf>, ReportError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "xlsx"))
            .collect();
        files.sort();
        files.reverse();
        Ok(files)
    }
}
