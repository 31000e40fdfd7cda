//! RemoteSync trait definition and mock implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::RemoteSyncError;
use crate::store::{Attempt, Progress, SavedConfig};

/// Best-effort secondary store.
///
/// May be unreachable at any time. The coordinator invokes these methods
/// detached from the caller's success path and absorbs every failure, so
/// implementations must bound their own timeouts rather than hang.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn push_attempt(&self, attempt: &Attempt) -> Result<(), RemoteSyncError>;
    async fn push_progress(&self, progress: &Progress) -> Result<(), RemoteSyncError>;
    async fn push_config(&self, config: &SavedConfig) -> Result<(), RemoteSyncError>;
    async fn delete_config(&self, id: &str) -> Result<(), RemoteSyncError>;
}

/// One payload mirrored to the secondary store
#[derive(Debug, Clone, PartialEq)]
pub enum RemotePush {
    Attempt(Attempt),
    Progress(Progress),
    Config(SavedConfig),
    ConfigDeleted(String),
}

/// RemoteSync test double: records pushes, with optional failure and delay
/// modes for outage and timeout tests
#[derive(Default)]
pub struct MockRemoteSync {
    pushes: RwLock<Vec<RemotePush>>,
    fail: AtomicBool,
    delay: RwLock<Option<Duration>>,
}

impl MockRemoteSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`RemoteSyncError::Unavailable`]
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delay every call, simulating a slow or hanging remote
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    /// Snapshot of everything pushed so far, oldest first
    pub async fn pushes(&self) -> Vec<RemotePush> {
        self.pushes.read().await.clone()
    }

    async fn record(&self, push: RemotePush) -> Result<(), RemoteSyncError> {
        if let Some(delay) = *self.delay.read().await {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteSyncError::Unavailable("remote failure injected".into()));
        }
        self.pushes.write().await.push(push);
        Ok(())
    }
}

#[async_trait]
impl RemoteSync for MockRemoteSync {
    async fn push_attempt(&self, attempt: &Attempt) -> Result<(), RemoteSyncError> {
        self.record(RemotePush::Attempt(attempt.clone())).await
    }

    async fn push_progress(&self, progress: &Progress) -> Result<(), RemoteSyncError> {
        self.record(RemotePush::Progress(progress.clone())).await
    }

    async fn push_config(&self, config: &SavedConfig) -> Result<(), RemoteSyncError> {
        self.record(RemotePush::Config(config.clone())).await
    }

    async fn delete_config(&self, id: &str) -> Result<(), RemoteSyncError> {
        self.record(RemotePush::ConfigDeleted(id.to_string())).await
    }
}
