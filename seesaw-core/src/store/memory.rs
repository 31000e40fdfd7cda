//! In-memory primary store
//!
//! Backs tests and single-process hosts. Failure injection lets tests
//! exercise the persistence-error paths without a real backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{Attempt, AttemptDraft, Progress, SavedConfig};
use super::{AttemptRecord, ConfigStore, ProgressStore};
use crate::error::StoreError;

/// HashMap-backed implementation of the store traits
#[derive(Default)]
pub struct MemoryStore {
    attempts: RwLock<HashMap<String, Attempt>>,
    progress: RwLock<HashMap<String, Progress>>,
    configs: RwLock<HashMap<String, SavedConfig>>,
    fail_writes: AtomicBool,
    fail_progress_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with [`StoreError::Unavailable`]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make standalone progress writes fail while attempt recording keeps
    /// working; simulates a level-advance write dying after the attempt
    /// landed
    pub fn set_fail_progress_writes(&self, fail: bool) {
        self.fail_progress_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write failure injected".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn record_attempt(&self, draft: AttemptDraft) -> Result<AttemptRecord, StoreError> {
        self.check_writable()?;
        // Both tables locked for the duration: insert and fold commit
        // together or not at all
        let mut attempts = self.attempts.write().await;
        let mut progress_map = self.progress.write().await;

        if let Some(id) = &draft.id {
            if let Some(existing) = attempts.get(id) {
                let key = Progress::key_for(&existing.user_id, &existing.activity_id);
                let progress = progress_map.get(&key).cloned().unwrap_or_else(|| {
                    Progress::new(
                        existing.user_id.clone(),
                        existing.activity_id.clone(),
                        existing.timestamp,
                    )
                });
                return Ok(AttemptRecord {
                    attempt: existing.clone(),
                    progress,
                    newly_recorded: false,
                });
            }
        }

        let id = draft
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let attempt = draft.into_attempt(id.clone());
        let key = Progress::key_for(&attempt.user_id, &attempt.activity_id);
        let mut progress = progress_map.get(&key).cloned().unwrap_or_else(|| {
            Progress::new(
                attempt.user_id.clone(),
                attempt.activity_id.clone(),
                attempt.timestamp,
            )
        });
        progress.apply(&attempt);

        attempts.insert(id, attempt.clone());
        progress_map.insert(key, progress.clone());
        Ok(AttemptRecord {
            attempt,
            progress,
            newly_recorded: true,
        })
    }

    async fn get_progress(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<Progress>, StoreError> {
        let key = Progress::key_for(user_id, activity_id);
        Ok(self.progress.read().await.get(&key).cloned())
    }

    async fn put_progress(&self, progress: &Progress) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.fail_progress_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "progress write failure injected".into(),
            ));
        }
        self.progress
            .write()
            .await
            .insert(progress.key(), progress.clone());
        Ok(())
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError> {
        Ok(self
            .progress
            .read()
            .await
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn attempts_for(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id && a.activity_id == activity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_config(&self, id: &str) -> Result<Option<SavedConfig>, StoreError> {
        Ok(self.configs.read().await.get(id).cloned())
    }

    async fn put_config(&self, config: &SavedConfig) -> Result<(), StoreError> {
        self.check_writable()?;
        self.configs
            .write()
            .await
            .insert(config.id.clone(), config.clone());
        Ok(())
    }

    async fn delete_config(&self, id: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.configs.write().await.remove(id);
        Ok(())
    }

    async fn configs_for_user(&self, owner: &str) -> Result<Vec<SavedConfig>, StoreError> {
        Ok(self
            .configs
            .read()
            .await
            .values()
            .filter(|c| c.created_by == owner)
            .cloned()
            .collect())
    }

    async fn public_configs(&self) -> Result<Vec<SavedConfig>, StoreError> {
        Ok(self
            .configs
            .read()
            .await
            .values()
            .filter(|c| c.is_public)
            .cloned()
            .collect())
    }
}
