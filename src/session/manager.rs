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
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::driver::MountDriver;
use super::error::ConnectError;
use crate::credentials::Identity;
use crate::share::canonical_host;

/// Shown in place of a username for sessions mounted without credentials.
pub const DEFAULT_IDENTITY: &str = "default";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Host plus username; `None` is an anonymous mount and never equals a
/// user named "default".
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct SessionKey {
    pub host: String,
    pub identity: Option<String>,
}

impl SessionKey {
    pub fn new(canonical_host: &str, identity: Option<&Identity>) -> Self {
        Self {
            host: canonical_host.to_string(),
            identity: identity.map(|i| i.username().to_string()),
        }
    }

    pub fn display_identity(&self) -> &str {
        self.identity.as_deref().unwrap_or(DEFAULT_IDENTITY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    pub host: String,
    pub identity: String,
    pub connected_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    /// A live session for the same host and identity already existed.
    Reused,
}

impl ConnectOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ConnectOutcome::Connected => "Connected",
            ConnectOutcome::Reused => "Already connected",
        }
    }
}

/// Process-wide table of mounted hosts.
///
/// Connects and disconnects for one host are serialized through a per-host
/// gate, so two workers never mount the same host at once. Different hosts
/// proceed in parallel.
pub struct SessionManager {
    driver: Arc<dyn MountDriver>,
    connect_timeout: Duration,
    sessions: RwLock<HashMap<SessionKey, RemoteSession>>,
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(driver: Arc<dyn MountDriver>) -> Self {
        Self::with_timeout(driver, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_timeout(driver: Arc<dyn MountDriver>, connect_timeout: Duration) -> Self {
        Self {
            driver,
            connect_timeout,
            sessions: RwLock::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    async fn gate(&self, host: &str) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().await;
        Arc::clone(gates.entry(host.to_string()).or_default())
    }

    /// Ensure a session exists for `address` under `identity`.
    pub async fn connect(
        &self,
        address: &str,
        identity: Option<&Identity>,
    ) -> Result<ConnectOutcome, ConnectError> {
        let host = canonical_host(address)?;
        let key = SessionKey::new(&host, identity);

        if self.sessions.read().await.contains_key(&key) {
            debug!("Reusing session to {} as {}", key.host, key.display_identity());
            return Ok(ConnectOutcome::Reused);
        }

        let gate = self.gate(&host).await;
        let _guard = gate.lock().await;

        // Another worker may have connected while we waited on the gate.
        if self.sessions.read().await.contains_key(&key) {
            debug!("Reusing session to {} as {}", key.host, key.display_identity());
            return Ok(ConnectOutcome::Reused);
        }

        self.teardown(&host).await;
        let dropped = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|k, _| k.host != host);
            before - sessions.len()
        };
        if dropped > 0 {
            debug!("Dropped {} stale session(s) to {}", dropped, host);
        }

        info!("Connecting to {} as {}", host, key.display_identity());

        let attempt = timeout(self.connect_timeout, self.driver.mount(&host, identity)).await;
        let output = match attempt {
            Err(_) => {
                warn!(
                    "Connection to {} timed out after {:?}",
                    host, self.connect_timeout
                );
                return Err(ConnectError::Timeout {
                    host,
                    after: self.connect_timeout,
                });
            }
            Ok(Err(e)) => {
                warn!("Failed to run mount command for {}: {}", host, e);
                return Err(ConnectError::Spawn {
                    host,
                    message: e.to_string(),
                });
            }
            Ok(Ok(output)) => output,
        };

        if !output.success {
            let message = output.diagnostic();
            warn!("Connection to {} failed: {}", host, message);
            return Err(ConnectError::Mount { host, message });
        }

        let session = RemoteSession {
            host: host.clone(),
            identity: key.display_identity().to_string(),
            connected_at: Local::now(),
        };
        self.sessions.write().await.insert(key, session);
        info!("Connected to {}", host);

        Ok(ConnectOutcome::Connected)
    }

    /// Unmount, swallowing every failure.
    async fn teardown(&self, host: &str) {
        match timeout(self.connect_timeout, self.driver.unmount(host)).await {
            Ok(Ok(output)) if output.success => debug!("Unmounted {}", host),
            Ok(Ok(output)) => debug!("Unmount of {} reported: {}", host, output.diagnostic()),
            Ok(Err(e)) => debug!("Unmount of {} failed: {}", host, e),
            Err(_) => debug!("Unmount of {} timed out", host),
        }
    }

    /// Tear down `address` and forget every session to it. Returns the number
    /// of table entries removed.
    pub async fn disconnect(&self, address: &str) -> usize {
        let host = match canonical_host(address) {
            Ok(host) => host,
            Err(e) => {
                warn!("Cannot disconnect {:?}: {}", address, e);
                return 0;
            }
        };

        let gate = self.gate(&host).await;
        let removed = {
            let _guard = gate.lock().await;

            self.teardown(&host).await;

            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|k, _| k.host != host);
            before - sessions.len()
        };
        if removed > 0 {
            info!("Disconnected from {}", host);
        }
        self.release_gate(&host, gate).await;
        removed
    }

    /// Forget the gate of a host nobody else is waiting on. Clones are only
    /// handed out under the map lock, so the count cannot grow meanwhile.
    async fn release_gate(&self, host: &str, gate: Arc<Mutex<()>>) {
        let mut gates = self.gates.lock().await;
        if Arc::strong_count(&gate) == 2 && gates.get(host).is_some_and(|g| Arc::ptr_eq(g, &gate))
        {
            gates.remove(host);
        }
    }

    /// Disconnect every known host. Returns the number of sessions removed.
    pub async fn disconnect_all(&self) -> usize {
        let mut hosts: Vec<String> = self
            .sessions
            .read()
            .await
            .keys()
            .map(|k| k.host.clone())
            .collect();
        hosts.sort();
        hosts.dedup();

        let mut removed = 0;
        for host in hosts {
            removed += self.disconnect(&host).await;
        }
        removed
    }

    /// Snapshot of live sessions ordered by host, then identity.
    pub async fn list_active(&self) -> Vec<RemoteSession> {
        let sessions = self.sessions.read().await;
        let mut entries: Vec<(&SessionKey, &RemoteSession)> = sessions.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, s)| s.clone()).collect()
    }

    pub async fn is_connected(&self, address: &str, identity: Option<&Identity>) -> bool {
        match canonical_host(address) {
            Ok(host) => self
                .sessions
                .read()
                .await
                .contains_key(&SessionKey::new(&host, identity)),
            Err(_) => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::driver::{MountOutput, NoopDriver};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FailingDriver {
        mounts: AtomicUsize,
    }

    #[async_trait]
    impl MountDriver for FailingDriver {
        async fn mount(
            &self,
            _host: &str,
            _identity: Option<&Identity>,
        ) -> std::io::Result<MountOutput> {
            self.mounts.fetch_add(1, Ordering::SeqCst);
            Ok(MountOutput::failed("System error 53 has occurred."))
        }

        async fn unmount(&self, _host: &str) -> std::io::Result<MountOutput> {
            Err(std::io::Error::other("not mounted"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn test_anonymous_key_differs_from_default_user() {
        let anonymous = SessionKey::new(r"\\S1", None);
        assert_eq!(anonymous.identity, None);
        assert_eq!(anonymous.display_identity(), DEFAULT_IDENTITY);

        let identity = Identity::new("svc", "pw");
        let key = SessionKey::new(r"\\S1", Some(&identity));
        assert_eq!(key.display_identity(), "svc");

        let named_default = Identity::new(DEFAULT_IDENTITY, "pw");
        assert_ne!(anonymous, SessionKey::new(r"\\S1", Some(&named_default)));
    }

    #[tokio::test]
    async fn test_disconnect_releases_host_gate() {
        let manager = SessionManager::new(Arc::new(NoopDriver));
        manager.connect("S1", None).await.unwrap();
        manager.connect("S2", None).await.unwrap();
        assert_eq!(manager.gates.lock().await.len(), 2);

        assert_eq!(manager.disconnect("S1").await, 1);
        let gates = manager.gates.lock().await;
        assert_eq!(gates.len(), 1);
        assert!(gates.contains_key(r"\\S2"));
        drop(gates);

        manager.disconnect_all().await;
        assert!(manager.gates.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_connect_normalizes_host() {
        let manager = SessionManager::new(Arc::new(NoopDriver));
        manager.connect("S1", None).await.unwrap();

        let active = manager.list_active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].host, r"\\S1");
        assert!(manager.is_connected(r"\\S1", None).await);
    }

    #[tokio::test]
    async fn test_failed_mount_is_not_recorded() {
        let driver = Arc::new(FailingDriver::default());
        let manager = SessionManager::new(driver.clone());

        let err = manager.connect("10.0.0.9", None).await.unwrap_err();
        assert_eq!(err.to_string(), "System error 53 has occurred.");
        assert_eq!(err.host(), Some(r"\\10.0.0.9"));
        assert!(manager.is_empty().await);

        // No caching of failures: the next attempt mounts again.
        let _ = manager.connect("10.0.0.9", None).await;
        assert_eq!(driver.mounts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_host_is_rejected_before_mounting() {
        let driver = Arc::new(FailingDriver::default());
        let manager = SessionManager::new(driver.clone());

        let err = manager.connect("  ", None).await.unwrap_err();
        assert!(matches!(err, ConnectError::InvalidHost(_)));
        assert_eq!(driver.mounts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_host_is_harmless() {
        let manager = SessionManager::new(Arc::new(FailingDriver::default()));
        assert_eq!(manager.disconnect("S9").await, 0);
        assert_eq!(manager.disconnect("").await, 0);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(ConnectOutcome::Connected.message(), "Connected");
        assert_eq!(ConnectOutcome::Reused.message(), "Already connected");
    }
}
