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

use common::{identity, RecordingDriver};
use fleetshare::credentials::Identity;
use fleetshare::session::{ConnectError, ConnectOutcome, SessionManager};
use std::sync::Arc;
use std::time::Duration;

fn manager(driver: &Arc<RecordingDriver>) -> SessionManager {
    SessionManager::new(Arc::clone(driver) as Arc<_>)
}

#[tokio::test]
async fn test_connect_twice_mounts_once() {
    let driver = Arc::new(RecordingDriver::new());
    let sessions = manager(&driver);
    let ops = identity();

    let first = sessions.connect("10.0.0.5", Some(&ops)).await.unwrap();
    let second = sessions.connect(r"\\10.0.0.5", Some(&ops)).await.unwrap();

    assert_eq!(first, ConnectOutcome::Connected);
    assert_eq!(second, ConnectOutcome::Reused);
    assert_eq!(driver.mount_count(), 1);
    assert_eq!(sessions.len().await, 1);
}

#[tokio::test]
async fn test_new_identity_replaces_previous_session() {
    let driver = Arc::new(RecordingDriver::new());
    let sessions = manager(&driver);
    let ops = identity();
    let admin = Identity::new("admin", "other");

    sessions.connect("10.0.0.5", Some(&ops)).await.unwrap();
    let outcome = sessions.connect("10.0.0.5", Some(&admin)).await.unwrap();
    assert_eq!(outcome, ConnectOutcome::Connected);

    let active = sessions.list_active().await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].host, r"\\10.0.0.5");
    assert_eq!(active[0].identity, "admin");
    assert!(!sessions.is_connected("10.0.0.5", Some(&ops)).await);

    // Each fresh connect tears down whatever was mounted before.
    assert_eq!(driver.unmount_count(), 2);
    assert_eq!(
        driver.mounted_users(),
        vec![Some(r"CORP\ops".to_string()), Some("admin".to_string())]
    );
}

#[tokio::test]
async fn test_anonymous_session_uses_default_identity() {
    let driver = Arc::new(RecordingDriver::new());
    let sessions = manager(&driver);

    sessions.connect("S001", None).await.unwrap();
    let active = sessions.list_active().await;
    assert_eq!(active[0].identity, "default");
    assert_eq!(driver.mounted_users(), vec![None]);
}

#[tokio::test]
async fn test_user_named_default_does_not_reuse_anonymous_session() {
    let driver = Arc::new(RecordingDriver::new());
    let sessions = manager(&driver);
    let named_default = Identity::new("default", "pw");

    sessions.connect("10.0.0.5", None).await.unwrap();
    let outcome = sessions
        .connect("10.0.0.5", Some(&named_default))
        .await
        .unwrap();

    assert_eq!(outcome, ConnectOutcome::Connected);
    assert_eq!(
        driver.mounted_users(),
        vec![None, Some("default".to_string())]
    );
    assert!(!sessions.is_connected("10.0.0.5", None).await);
    assert!(sessions.is_connected("10.0.0.5", Some(&named_default)).await);
}

#[tokio::test]
async fn test_disconnect_all_returns_count() {
    let driver = Arc::new(RecordingDriver::new());
    let sessions = manager(&driver);
    let ops = identity();

    for host in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        sessions.connect(host, Some(&ops)).await.unwrap();
    }
    assert_eq!(sessions.len().await, 3);

    assert_eq!(sessions.disconnect_all().await, 3);
    assert!(sessions.is_empty().await);
    assert!(sessions.list_active().await.is_empty());
    assert_eq!(sessions.disconnect_all().await, 0);
}

#[tokio::test]
async fn test_disconnect_removes_every_identity_for_host() {
    let driver = Arc::new(RecordingDriver::new());
    let sessions = manager(&driver);

    sessions.connect("10.0.0.5", Some(&identity())).await.unwrap();
    sessions.connect("10.0.0.6", None).await.unwrap();

    assert_eq!(sessions.disconnect(r"\\10.0.0.5").await, 1);
    assert!(!sessions.is_connected("10.0.0.5", Some(&identity())).await);
    assert!(sessions.is_connected("10.0.0.6", None).await);
}

#[tokio::test]
async fn test_failed_mount_reports_diagnostic() {
    let driver = Arc::new(RecordingDriver::new().failing("10.0.0.9"));
    let sessions = manager(&driver);

    let err = sessions
        .connect("10.0.0.9", Some(&identity()))
        .await
        .unwrap_err();
    match &err {
        ConnectError::Mount { host, message } => {
            assert_eq!(host, r"\\10.0.0.9");
            assert_eq!(message, "System error 53 has occurred.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(sessions.is_empty().await);

    // A failure is not cached: the next attempt mounts again.
    let _ = sessions.connect("10.0.0.9", Some(&identity())).await;
    assert_eq!(driver.mounts_of("10.0.0.9"), 2);
}

#[tokio::test]
async fn test_slow_mount_times_out() {
    let driver = Arc::new(RecordingDriver::new().with_delay(Duration::from_millis(500)));
    let sessions =
        SessionManager::with_timeout(Arc::clone(&driver) as Arc<_>, Duration::from_millis(100));

    let err = sessions
        .connect("10.0.0.5", Some(&identity()))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "Connection timed out");
    assert!(sessions.is_empty().await);
}

#[tokio::test]
async fn test_concurrent_connects_mount_once() {
    let driver = Arc::new(RecordingDriver::new().with_delay(Duration::from_millis(50)));
    let sessions = Arc::new(manager(&driver));
    let ops = identity();

    let attempts = (0..8).map(|_| {
        let sessions = Arc::clone(&sessions);
        let ops = ops.clone();
        tokio::spawn(async move { sessions.connect("10.0.0.5", Some(&ops)).await })
    });
    let outcomes = futures::future::join_all(attempts).await;

    let mut connected = 0;
    for outcome in outcomes {
        if outcome.unwrap().unwrap() == ConnectOutcome::Connected {
            connected += 1;
        }
    }
    assert_eq!(connected, 1);
    assert_eq!(driver.mount_count(), 1);
    assert_eq!(sessions.len().await, 1);
}
