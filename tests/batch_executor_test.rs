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

mod common;

use chrono::{Local, TimeZone};
use common::{identity, seed_remote_file, RecordingDriver};
use fleetshare::executor::{BatchExecutor, OperationResult, Outcome, RowErrorKind};
use fleetshare::report::Summary;
use fleetshare::roster::{Roster, RosterRow};
use fleetshare::session::SessionManager;
use fleetshare::share::ShareLayout;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn executor(driver: &Arc<RecordingDriver>, root: &Path) -> BatchExecutor {
    let sessions = Arc::new(SessionManager::new(Arc::clone(driver) as Arc<_>));
    BatchExecutor::new(sessions, ShareLayout::MountRoot(root.to_path_buf()))
}

fn new_year_morning() -> SystemTime {
    Local
        .with_ymd_and_hms(2024, 1, 1, 10, 0, 0)
        .single()
        .unwrap()
        .into()
}

fn two_store_roster() -> Roster {
    Roster::from_rows(vec![
        RosterRow::new("S1", "10.0.0.5"),
        RosterRow::new("S2", "10.0.0.9"),
    ])
}

fn outcomes(results: &[OperationResult]) -> Vec<(String, Outcome)> {
    results
        .iter()
        .map(|r| (r.code().to_string(), r.outcome()))
        .collect()
}

#[tokio::test]
async fn test_check_reachable_and_unreachable_store() {
    let root = TempDir::new().unwrap();
    seed_remote_file(
        root.path(),
        "10.0.0.5",
        &["data", "in"],
        "report.txt",
        120,
        new_year_morning(),
    );
    let driver = Arc::new(RecordingDriver::new().failing("10.0.0.9"));
    let executor = executor(&driver, root.path());

    let run = executor
        .check_existence(&two_store_roster(), Some(&identity()), r"data\in", "report.txt")
        .await;
    assert_eq!(run.results.len(), 2);
    assert_eq!(run.skipped, 0);

    let s1 = &run.results[0];
    assert_eq!(s1.code(), "S1");
    assert_eq!(s1.outcome(), Outcome::Found);
    assert_eq!(s1.outcome().label(), "Yes");
    assert_eq!(s1.size(), Some(120));
    assert_eq!(s1.modified(), Some("2024-01-01 10:00:00"));
    assert_eq!(s1.path(), r"\\10.0.0.5\data\in\report.txt");
    assert!(s1.error().is_none());

    let s2 = &run.results[1];
    assert_eq!(s2.code(), "S2");
    assert_eq!(s2.outcome(), Outcome::NotFound);
    assert_eq!(s2.outcome().label(), "No");
    assert_eq!(s2.size(), None);
    let error = s2.error().unwrap();
    assert_eq!(error.kind, RowErrorKind::Connect);
    assert!(error.to_string().starts_with("Connection failed: "));
    assert_eq!(s2.path(), r"\\10.0.0.9\data\in\report.txt");

    let summary = Summary::from_rows(&run.results);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.found(), 1);
    assert_eq!(summary.not_found(), 1);
}

#[tokio::test]
async fn test_missing_file_on_reachable_store() {
    let root = TempDir::new().unwrap();
    let driver = Arc::new(RecordingDriver::new());
    let executor = executor(&driver, root.path());

    let roster = Roster::from_rows(vec![RosterRow::new("S1", "10.0.0.5")]);
    let run = executor
        .check_existence(&roster, Some(&identity()), r"data\in", "report.txt")
        .await;

    let error = run.results[0].error().unwrap();
    assert_eq!(error.kind, RowErrorKind::NotFound);
    assert_eq!(error.to_string(), "File not found");
}

#[tokio::test]
async fn test_check_without_identity_skips_mounting() {
    let root = TempDir::new().unwrap();
    seed_remote_file(
        root.path(),
        "10.0.0.5",
        &["in"],
        "a.txt",
        3,
        SystemTime::now(),
    );
    let driver = Arc::new(RecordingDriver::new());
    let executor = executor(&driver, root.path());

    let roster = Roster::from_rows(vec![RosterRow::new("S1", "10.0.0.5")]);
    let run = executor.check_existence(&roster, None, "in", "a.txt").await;

    assert_eq!(run.results[0].outcome(), Outcome::Found);
    assert_eq!(driver.mount_count(), 0);
}

#[tokio::test]
async fn test_unreachable_rows_are_isolated() {
    let root = TempDir::new().unwrap();
    let driver = Arc::new(
        RecordingDriver::new()
            .failing("10.0.0.2")
            .failing("10.0.0.4"),
    );
    let executor = executor(&driver, root.path());

    let source_dir = TempDir::new().unwrap();
    let source = source_dir.path().join("prices.csv");
    std::fs::write(&source, "sku,price\n").unwrap();

    let roster = Roster::from_rows(
        (1..=5)
            .map(|i| RosterRow::new(format!("S{i}"), format!("10.0.0.{i}")))
            .collect(),
    );
    let run = executor
        .transfer(&roster, Some(&identity()), "in", &[source])
        .await;

    assert_eq!(run.results.len(), 5);
    let failed: Vec<_> = run.results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 2);
    for result in &failed {
        assert_eq!(result.outcome(), Outcome::Failed);
        assert!(!result.error().unwrap().message.is_empty());
    }
    assert_eq!(
        run.results
            .iter()
            .filter(|r| r.outcome() == Outcome::Success)
            .count(),
        3
    );
}

#[tokio::test]
async fn test_check_rerun_is_stable() {
    let root = TempDir::new().unwrap();
    seed_remote_file(
        root.path(),
        "10.0.0.5",
        &["data", "in"],
        "report.txt",
        120,
        new_year_morning(),
    );
    let driver = Arc::new(RecordingDriver::new().failing("10.0.0.9"));
    let executor = executor(&driver, root.path());
    let roster = two_store_roster();

    let first = executor
        .check_existence(&roster, Some(&identity()), r"data\in", "report.txt")
        .await;
    let second = executor
        .check_existence(&roster, Some(&identity()), r"data\in", "report.txt")
        .await;

    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.outcome(), b.outcome());
        assert_eq!(a.size(), b.size());
        assert_eq!(a.modified(), b.modified());
    }
    // The reachable store is mounted once; the failing one is retried.
    assert_eq!(driver.mounts_of("10.0.0.5"), 1);
    assert_eq!(driver.mounts_of("10.0.0.9"), 2);
}

#[tokio::test]
async fn test_transfer_copies_and_preserves_mtime() {
    let root = TempDir::new().unwrap();
    let driver = Arc::new(RecordingDriver::new().failing("10.0.0.9"));
    let executor = executor(&driver, root.path());

    let source_dir = TempDir::new().unwrap();
    let source = source_dir.path().join("menu.json");
    std::fs::write(&source, br#"{"items":[]}"#).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&source)
        .unwrap()
        .set_modified(new_year_morning())
        .unwrap();

    let run = executor
        .transfer(&two_store_roster(), Some(&identity()), r"data\new", &[source])
        .await;

    let ok = &run.results[0];
    assert_eq!(ok.outcome(), Outcome::Success);
    assert_eq!(ok.outcome().label(), "Success");
    assert_eq!(ok.path(), r"\\10.0.0.5\data\new\menu.json");

    let copied = root.path().join("10.0.0.5/data/new/menu.json");
    assert_eq!(std::fs::read(&copied).unwrap(), br#"{"items":[]}"#);
    assert_eq!(
        std::fs::metadata(&copied).unwrap().modified().unwrap(),
        new_year_morning()
    );

    let failed = &run.results[1];
    assert_eq!(failed.outcome(), Outcome::Failed);
    assert_eq!(failed.path(), r"\\10.0.0.9\data\new\menu.json");
    assert!(failed.error().unwrap().is_connection_failure());
    assert!(!root.path().join("10.0.0.9").exists());
}

#[tokio::test]
async fn test_transfer_overwrites_existing_file() {
    let root = TempDir::new().unwrap();
    seed_remote_file(
        root.path(),
        "10.0.0.5",
        &["in"],
        "a.txt",
        500,
        SystemTime::now(),
    );
    let driver = Arc::new(RecordingDriver::new());
    let executor = executor(&driver, root.path());

    let source_dir = TempDir::new().unwrap();
    let source = source_dir.path().join("a.txt");
    std::fs::write(&source, "new").unwrap();

    let roster = Roster::from_rows(vec![RosterRow::new("S1", "10.0.0.5")]);
    let run = executor
        .transfer(&roster, Some(&identity()), "in", &[source])
        .await;

    assert!(run.results[0].is_success());
    assert_eq!(
        std::fs::read_to_string(root.path().join("10.0.0.5/in/a.txt")).unwrap(),
        "new"
    );
}

#[tokio::test]
async fn test_unreadable_source_fails_only_its_rows() {
    let root = TempDir::new().unwrap();
    let driver = Arc::new(RecordingDriver::new());
    let executor = executor(&driver, root.path());

    let source_dir = TempDir::new().unwrap();
    let good = source_dir.path().join("good.txt");
    std::fs::write(&good, "ok").unwrap();
    let missing = source_dir.path().join("missing.txt");

    let run = executor
        .transfer(
            &two_store_roster(),
            Some(&identity()),
            "in",
            &[missing, good],
        )
        .await;

    // File-major order: both rows for missing.txt, then both for good.txt.
    let files: Vec<_> = run
        .results
        .iter()
        .map(|r| (r.file_name().to_string(), r.code().to_string()))
        .collect();
    assert_eq!(
        files,
        vec![
            ("missing.txt".to_string(), "S1".to_string()),
            ("missing.txt".to_string(), "S2".to_string()),
            ("good.txt".to_string(), "S1".to_string()),
            ("good.txt".to_string(), "S2".to_string()),
        ]
    );

    for result in &run.results[..2] {
        assert_eq!(result.outcome(), Outcome::Failed);
        assert_eq!(result.error().unwrap().kind, RowErrorKind::Io);
    }
    assert!(run.results[2..].iter().all(|r| r.is_success()));
    // Only good.txt needed the shares mounted.
    assert_eq!(driver.mount_count(), 2);
}

#[tokio::test]
async fn test_parallel_batch_keeps_roster_order() {
    let root = TempDir::new().unwrap();
    let driver = Arc::new(
        RecordingDriver::new()
            .with_delay(Duration::from_millis(20))
            .failing("10.0.0.3"),
    );
    let executor = executor(&driver, root.path()).with_parallel(4);

    let roster = Roster::from_rows(
        (1..=8)
            .map(|i| RosterRow::new(format!("S{i}"), format!("10.0.0.{i}")))
            .collect(),
    );
    let run = executor
        .check_existence(&roster, Some(&identity()), "in", "a.txt")
        .await;

    let codes: Vec<_> = outcomes(&run.results)
        .into_iter()
        .map(|(code, _)| code)
        .collect();
    let expected: Vec<_> = (1..=8).map(|i| format!("S{i}")).collect();
    assert_eq!(codes, expected);
    assert_eq!(
        run.results[2].error().unwrap().kind,
        RowErrorKind::Connect
    );
    assert_eq!(driver.mount_count(), 8);
}

#[tokio::test]
async fn test_cancelled_batch_starts_nothing() {
    let root = TempDir::new().unwrap();
    let driver = Arc::new(RecordingDriver::new());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let executor = executor(&driver, root.path()).with_cancellation(cancel);

    let run = executor
        .check_existence(&two_store_roster(), Some(&identity()), "in", "a.txt")
        .await;

    assert!(run.results.is_empty());
    assert_eq!(run.skipped, 2);
    assert!(run.was_cancelled());
    assert_eq!(driver.mount_count(), 0);
}

#[tokio::test]
async fn test_cancel_mid_batch_reports_finished_rows() {
    let root = TempDir::new().unwrap();
    let driver = Arc::new(RecordingDriver::new().with_delay(Duration::from_millis(200)));
    let cancel = CancellationToken::new();
    let executor = executor(&driver, root.path()).with_cancellation(cancel.clone());

    let roster = Roster::from_rows(
        (1..=4)
            .map(|i| RosterRow::new(format!("S{i}"), format!("10.0.0.{i}")))
            .collect(),
    );

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });
    let run = executor
        .check_existence(&roster, Some(&identity()), "in", "a.txt")
        .await;
    canceller.await.unwrap();

    // S1 finished and S2 was in flight when cancelled; both are reported.
    assert_eq!(
        outcomes(&run.results)
            .into_iter()
            .map(|(code, _)| code)
            .collect::<Vec<_>>(),
        vec!["S1", "S2"]
    );
    assert_eq!(run.skipped, 2);
}

#[tokio::test]
async fn test_bulk_probe_messages() {
    let root = TempDir::new().unwrap();
    let driver = Arc::new(RecordingDriver::new().failing("10.0.0.9"));
    let executor = executor(&driver, root.path());

    let addresses = vec!["10.0.0.5".to_string(), "10.0.0.9".to_string()];
    let run = executor.test_connections(&addresses, &identity()).await;

    assert!(run.results[0].is_success());
    assert_eq!(run.results[0].message, "Connected");
    assert!(!run.results[1].is_success());
    assert_eq!(
        run.results[1].message,
        "Connection failed: System error 53 has occurred."
    );

    let again = executor.test_connections(&addresses[..1], &identity()).await;
    assert_eq!(again.results[0].message, "Already connected");
}
