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

//! Per-row results of batch operations.

use owo_colors::OwoColorize;
use std::fmt;

use crate::session::ConnectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Check,
    Transfer,
    ConnectionTest,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Check => "check",
            OperationKind::Transfer => "transfer",
            OperationKind::ConnectionTest => "connection test",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Found,
    NotFound,
    Success,
    Failed,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::NotFound | Outcome::Failed)
    }

    /// Text written to the report's status column.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Found => "Yes",
            Outcome::NotFound => "No",
            Outcome::Success => "Success",
            Outcome::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowErrorKind {
    Connect,
    Timeout,
    Io,
    NotFound,
}

/// Typed failure attached to a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub kind: RowErrorKind,
    pub message: String,
}

impl RowError {
    pub fn new(kind: RowErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(RowErrorKind::Io, message)
    }

    pub fn file_not_found() -> Self {
        Self::new(RowErrorKind::NotFound, "File not found")
    }

    pub fn is_connection_failure(&self) -> bool {
        matches!(self.kind, RowErrorKind::Connect | RowErrorKind::Timeout)
    }
}

impl From<&ConnectError> for RowError {
    fn from(e: &ConnectError) -> Self {
        let kind = if e.is_timeout() {
            RowErrorKind::Timeout
        } else {
            RowErrorKind::Connect
        };
        Self::new(kind, e.to_string())
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_connection_failure() {
            write!(f, "Connection failed: {}", self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

/// Outcome of one operation against one roster row.
///
/// The constructors keep `error` set exactly when the outcome is a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    code: String,
    address: String,
    kind: OperationKind,
    file_name: String,
    outcome: Outcome,
    path: String,
    size: Option<u64>,
    modified: Option<String>,
    error: Option<RowError>,
}

impl OperationResult {
    pub fn found(
        code: impl Into<String>,
        address: impl Into<String>,
        file_name: impl Into<String>,
        path: impl Into<String>,
        size: u64,
        modified: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            address: address.into(),
            kind: OperationKind::Check,
            file_name: file_name.into(),
            outcome: Outcome::Found,
            path: path.into(),
            size: Some(size),
            modified: Some(modified.into()),
            error: None,
        }
    }

    pub fn not_found(
        code: impl Into<String>,
        address: impl Into<String>,
        file_name: impl Into<String>,
        path: impl Into<String>,
        error: RowError,
    ) -> Self {
        Self {
            code: code.into(),
            address: address.into(),
            kind: OperationKind::Check,
            file_name: file_name.into(),
            outcome: Outcome::NotFound,
            path: path.into(),
            size: None,
            modified: None,
            error: Some(error),
        }
    }

    pub fn transferred(
        code: impl Into<String>,
        address: impl Into<String>,
        file_name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            address: address.into(),
            kind: OperationKind::Transfer,
            file_name: file_name.into(),
            outcome: Outcome::Success,
            path: path.into(),
            size: None,
            modified: None,
            error: None,
        }
    }

    pub fn transfer_failed(
        code: impl Into<String>,
        address: impl Into<String>,
        file_name: impl Into<String>,
        path: impl Into<String>,
        error: RowError,
    ) -> Self {
        Self {
            code: code.into(),
            address: address.into(),
            kind: OperationKind::Transfer,
            file_name: file_name.into(),
            outcome: Outcome::Failed,
            path: path.into(),
            size: None,
            modified: None,
            error: Some(error),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Resolved remote path, or the raw one when no session was made.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Modification time formatted `%Y-%m-%d %H:%M:%S`.
    pub fn modified(&self) -> Option<&str> {
        self.modified.as_deref()
    }

    pub fn error(&self) -> Option<&RowError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        !self.outcome.is_failure()
    }

    pub fn print_summary(&self) {
        let target = format!("{} ({})", self.code, self.address);
        if self.is_success() {
            let detail = match self.kind {
                OperationKind::Check => match self.size {
                    Some(size) => format!(
                        "found {} ({})",
                        self.path,
                        crate::utils::format_bytes(size)
                    ),
                    None => format!("found {}", self.path),
                },
                _ => format!("{} -> {}", self.file_name, self.path),
            };
            println!("{} {}: {}", "●".green(), target.bold(), detail.green());
        } else {
            let headline = match self.kind {
                OperationKind::Check => format!("{} not found", self.file_name),
                _ => format!("Failed to transfer {}", self.file_name),
            };
            println!("{} {}: {}", "●".red(), target.bold(), headline.red());
            if let Some(error) = &self.error {
                println!("    {}", error.to_string().dimmed());
            }
        }
    }
}

/// Outcome of probing one address during a connectivity sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProbe {
    pub address: String,
    pub outcome: Outcome,
    pub message: String,
}

impl ConnectionProbe {
    pub fn succeeded(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            outcome: Outcome::Success,
            message: message.into(),
        }
    }

    pub fn failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            outcome: Outcome::Failed,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn print_summary(&self) {
        if self.is_success() {
            println!(
                "{} {}: {}",
                "●".green(),
                self.address.bold(),
                self.message.green()
            );
        } else {
            println!(
                "{} {}: {}",
                "●".red(),
                self.address.bold(),
                self.message.red()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_present_only_on_failure() {
        let found = OperationResult::found("S1", "10.0.0.5", "a.txt", r"\\10.0.0.5\a.txt", 5, "t");
        assert!(found.is_success());
        assert!(found.error().is_none());

        let missing = OperationResult::not_found(
            "S1",
            "10.0.0.5",
            "a.txt",
            r"\\10.0.0.5\a.txt",
            RowError::file_not_found(),
        );
        assert!(!missing.is_success());
        assert_eq!(missing.error().unwrap().to_string(), "File not found");
        assert!(missing.size().is_none());
        assert!(missing.modified().is_none());
    }

    #[test]
    fn test_connection_errors_are_prefixed() {
        let err = ConnectError::Mount {
            host: r"\\10.0.0.9".into(),
            message: "System error 53 has occurred.".into(),
        };
        let row = RowError::from(&err);
        assert_eq!(row.kind, RowErrorKind::Connect);
        assert_eq!(
            row.to_string(),
            "Connection failed: System error 53 has occurred."
        );

        let timeout = ConnectError::Timeout {
            host: r"\\10.0.0.9".into(),
            after: Duration::from_secs(10),
        };
        let row = RowError::from(&timeout);
        assert_eq!(row.kind, RowErrorKind::Timeout);
        assert_eq!(row.to_string(), "Connection failed: Connection timed out");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Found.label(), "Yes");
        assert_eq!(Outcome::NotFound.label(), "No");
        assert_eq!(Outcome::Success.label(), "Success");
        assert_eq!(Outcome::Failed.label(), "Failed");
        assert!(Outcome::NotFound.is_failure());
        assert!(!Outcome::Success.is_failure());
    }
}
