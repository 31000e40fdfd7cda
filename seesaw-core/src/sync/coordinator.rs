//! Dual-write persistence coordinator
//!
//! Writes go to the primary store first and must succeed; only then is the
//! same payload mirrored to the secondary store on a detached task. A
//! secondary failure is logged and published to the event sink, never
//! surfaced to the caller.
//!
//! Progress updates for one (user, activity) pair are serialized behind a
//! per-key lock so the read-modify-write fold never interleaves. There is
//! no global lock; different pairs proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::remote::RemoteSync;
use crate::error::StoreError;
use crate::events::{EventSink, SyncEvent};
use crate::store::{Attempt, AttemptDraft, Progress, ProgressStore};

/// Coordinates primary-must-succeed writes with best-effort mirroring
pub struct SyncCoordinator<S: ProgressStore> {
    store: Arc<S>,
    remote: Arc<dyn RemoteSync>,
    sink: Arc<dyn EventSink>,
    /// Per (user, activity) write locks
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: ProgressStore> SyncCoordinator<S> {
    pub fn new(store: Arc<S>, remote: Arc<dyn RemoteSync>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            remote,
            sink,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock guarding progress updates for one (user, activity) pair.
    ///
    /// Entries no task currently holds are swept out here, so the map stays
    /// bounded by the number of in-flight keys rather than growing for the
    /// coordinator's lifetime.
    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Record an attempt and fold it into the derived progress document.
    ///
    /// The store commits the attempt row and the fold atomically, so a
    /// failure here leaves neither behind and the caller can replay the
    /// same draft. The fold is applied exactly once per attempt identity:
    /// replaying a draft whose id the store has already seen changes
    /// nothing and mirrors nothing.
    pub async fn record_attempt(&self, draft: AttemptDraft) -> Result<Attempt, StoreError> {
        let key = Progress::key_for(&draft.user_id, &draft.activity_id);
        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;

        let record = self.store.record_attempt(draft).await.map_err(|e| {
            error!(error = %e, "primary attempt write failed");
            e
        })?;
        let attempt = record.attempt;

        if record.newly_recorded {
            let progress = record.progress;
            debug!(
                user_id = %attempt.user_id,
                activity_id = %attempt.activity_id,
                attempts = progress.attempts,
                "attempt recorded and progress folded"
            );

            self.sink
                .publish(SyncEvent::AttemptRecorded {
                    attempt_id: attempt.id.clone(),
                    user_id: attempt.user_id.clone(),
                    activity_id: attempt.activity_id.clone(),
                    success: attempt.success,
                })
                .await;
            self.sink
                .publish(SyncEvent::ProgressSaved {
                    user_id: progress.user_id.clone(),
                    activity_id: progress.activity_id.clone(),
                    attempts: progress.attempts,
                    successes: progress.successes,
                })
                .await;

            self.mirror_attempt(attempt.clone(), progress);
        } else {
            debug!(attempt_id = %attempt.id, "replayed attempt; progress unchanged");
        }

        Ok(attempt)
    }

    /// Write a progress document to the primary store and mirror it
    pub async fn save_progress(&self, progress: &Progress) -> Result<(), StoreError> {
        let lock = self.key_lock(&progress.key()).await;
        let _guard = lock.lock().await;

        self.store.put_progress(progress).await.map_err(|e| {
            error!(error = %e, "primary progress write failed");
            e
        })?;

        self.sink
            .publish(SyncEvent::ProgressSaved {
                user_id: progress.user_id.clone(),
                activity_id: progress.activity_id.clone(),
                attempts: progress.attempts,
                successes: progress.successes,
            })
            .await;

        self.mirror_progress(progress.clone());
        Ok(())
    }

    /// Durably record a level advance in the progress document.
    ///
    /// Used by callers that must persist the advance before applying it to
    /// in-memory state.
    pub async fn record_level_advance(
        &self,
        user_id: &str,
        activity_id: &str,
        level: u32,
    ) -> Result<(), StoreError> {
        let key = Progress::key_for(user_id, activity_id);
        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;

        let mut progress = self
            .store
            .get_progress(user_id, activity_id)
            .await?
            .unwrap_or_else(|| {
                Progress::new(
                    user_id.to_string(),
                    activity_id.to_string(),
                    chrono::Utc::now(),
                )
            });
        progress.current_level = level;
        self.store.put_progress(&progress).await?;

        self.sink
            .publish(SyncEvent::LevelAdvanced {
                user_id: user_id.to_string(),
                activity_id: activity_id.to_string(),
                level,
            })
            .await;

        self.mirror_progress(progress);
        Ok(())
    }

    /// Mirror an attempt and its folded progress on a detached task.
    ///
    /// Dispatched only after the primary write's success is known and never
    /// awaited by the caller, so a slow remote imposes no backpressure.
    fn mirror_attempt(&self, attempt: Attempt, progress: Progress) {
        let remote = Arc::clone(&self.remote);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = remote.push_attempt(&attempt).await {
                warn!(error = %e, "failed to sync attempt with remote");
                sink.publish(SyncEvent::RemoteSyncFailed {
                    operation: "push_attempt".into(),
                    reason: e.to_string(),
                })
                .await;
            }
            if let Err(e) = remote.push_progress(&progress).await {
                warn!(error = %e, "failed to sync progress with remote");
                sink.publish(SyncEvent::RemoteSyncFailed {
                    operation: "push_progress".into(),
                    reason: e.to_string(),
                })
                .await;
            }
        });
    }

    fn mirror_progress(&self, progress: Progress) {
        let remote = Arc::clone(&self.remote);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = remote.push_progress(&progress).await {
                warn!(error = %e, "failed to sync progress with remote");
                sink.publish(SyncEvent::RemoteSyncFailed {
                    operation: "push_progress".into(),
                    reason: e.to_string(),
                })
                .await;
            }
        });
    }
}
