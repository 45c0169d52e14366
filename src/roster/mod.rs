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

//! Fleet rosters read from spreadsheets.
//!
//! The first worksheet is used and its first row is the header. Check and
//! transfer batches need the exact columns [`CODE_COLUMN`] and
//! [`ADDRESS_COLUMN`]; connectivity sweeps look for any address-like column
//! with [`find_address_column`].

use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CODE_COLUMN: &str = "CodeMag";
pub const ADDRESS_COLUMN: &str = "ipaddress";

/// Extensions offered when listing rosters in a data directory.
pub const ROSTER_EXTENSIONS: &[&str] = &["xlsx", "xls"];

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to read roster {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Roster {} has no worksheet", path.display())]
    NoWorksheet { path: PathBuf },

    #[error(
        "Missing required column(s): {}. Available columns: {}",
        missing.join(", "),
        available.join(", ")
    )]
    Schema {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("No IP address column found. Available columns: {}", available.join(", "))]
    NoAddressColumn { available: Vec<String> },

    #[error("No valid IP addresses found in roster")]
    NoAddresses,
}

impl RosterError {
    /// Whether the roster was readable but has the wrong shape.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            RosterError::Schema { .. } | RosterError::NoAddressColumn { .. }
        )
    }
}

/// A header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read the first worksheet of `path`.
    pub fn read(path: &Path) -> Result<Self, RosterError> {
        let read_error = |message: String| RosterError::Read {
            path: path.to_path_buf(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| read_error(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| RosterError::NoWorksheet {
                path: path.to_path_buf(),
            })?
            .map_err(|e| read_error(e.to_string()))?;

        let mut rows = range.rows();
        let columns: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(|c| cell_text(c).trim().to_string()).collect(),
            None => Vec::new(),
        };
        let rows: Vec<Vec<String>> = rows
            .map(|row| row.iter().map(cell_text).collect())
            .filter(|row: &Vec<String>| row.iter().any(|c| !c.trim().is_empty()))
            .collect();

        debug!(
            "Read {} row(s) with columns {:?} from {:?}",
            rows.len(),
            columns,
            path
        );
        Ok(Self { columns, rows })
    }

    /// Read `path` and check that every `required` column is present.
    pub fn load(path: &Path, required: &[&str]) -> Result<Self, RosterError> {
        let table = Self::read(path)?;
        table.require(required)?;
        Ok(table)
    }

    pub fn require(&self, required: &[&str]) -> Result<(), RosterError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RosterError::Schema {
                missing,
                available: self.columns.clone(),
            })
        }
    }

    /// Case-sensitive column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell text, empty when the row is shorter than the header.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Numeric store codes come back as floats; drop the ".0".
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        other => other.to_string(),
    }
}

/// Whether an address cell should be ignored.
pub fn is_blank_address(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || ["nan", "none", "null"]
            .iter()
            .any(|blank| value.eq_ignore_ascii_case(blank))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub code: String,
    pub address: String,
}

impl RosterRow {
    pub fn new(code: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            address: address.into(),
        }
    }
}

/// The ordered fleet a check or transfer batch runs over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    rows: Vec<RosterRow>,
}

impl Roster {
    /// Rows with a blank address are dropped; order is kept.
    pub fn from_rows(rows: Vec<RosterRow>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|row| {
                let keep = !is_blank_address(&row.address);
                if !keep {
                    debug!("Skipping roster row {:?} without an address", row.code);
                }
                keep
            })
            .map(|row| RosterRow {
                code: row.code.trim().to_string(),
                address: row.address.trim().to_string(),
            })
            .collect();
        Self { rows }
    }

    /// Load a roster requiring the `CodeMag` and `ipaddress` columns.
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let table = Table::load(path, &[CODE_COLUMN, ADDRESS_COLUMN])?;
        Ok(Self::from_table(&table))
    }

    fn from_table(table: &Table) -> Self {
        // Both columns were checked by `Table::load`.
        let code = table.column_index(CODE_COLUMN).unwrap_or_default();
        let address = table.column_index(ADDRESS_COLUMN).unwrap_or_default();

        Self::from_rows(
            (0..table.rows.len())
                .map(|i| RosterRow::new(table.cell(i, code), table.cell(i, address)))
                .collect(),
        )
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }
}

/// A column picked by [`find_address_column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String,
}

/// Find the column holding host addresses.
///
/// Matching is case-insensitive: a name containing both `ip` and `address`,
/// or one of `ip`, `ip address`, `adresse ip`. The first match wins.
pub fn find_address_column<S: AsRef<str>>(names: &[S]) -> Option<ColumnRef> {
    names.iter().enumerate().find_map(|(index, name)| {
        let lower = name.as_ref().trim().to_lowercase();
        let matches = (lower.contains("ip") && lower.contains("address"))
            || matches!(lower.as_str(), "ip" | "ip address" | "adresse ip");
        matches.then(|| ColumnRef {
            index,
            name: name.as_ref().to_string(),
        })
    })
}

/// Unique, non-blank addresses from a table in first-seen order.
pub fn unique_addresses(table: &Table) -> Result<(ColumnRef, Vec<String>), RosterError> {
    let column =
        find_address_column(&table.columns).ok_or_else(|| RosterError::NoAddressColumn {
            available: table.columns.clone(),
        })?;

    let mut seen = HashSet::new();
    let addresses: Vec<String> = (0..table.rows.len())
        .map(|i| table.cell(i, column.index).trim())
        .filter(|a| !is_blank_address(a))
        .filter(|a| seen.insert(a.to_string()))
        .map(str::to_string)
        .collect();

    if addresses.is_empty() {
        return Err(RosterError::NoAddresses);
    }
    Ok((column, addresses))
}

/// Read a roster for a connectivity sweep.
pub fn load_addresses(path: &Path) -> Result<(ColumnRef, Vec<String>), RosterError> {
    unique_addresses(&Table::read(path)?)
}

/// Spreadsheets in `dir`, sorted by file name. Office lock files are skipped.
pub fn list_roster_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("~$") {
            continue;
        }
        let is_roster = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                ROSTER_EXTENSIONS
                    .iter()
                    .any(|known| e.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);
        if is_roster {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
