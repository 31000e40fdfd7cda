//! Primary document store traits and implementations
//!
//! The primary store is the authoritative backend: writes here must succeed
//! before anything else happens. It is assumed strongly consistent for
//! single-key read-after-write.

mod memory;
mod migrations;
mod sqlite;
mod types;

use async_trait::async_trait;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{
    Attempt, AttemptDraft, Difficulty, HISTORY_CAP, Progress, SavedConfig, SavedConfigDraft,
};

/// Result of durably recording an attempt.
///
/// `newly_recorded` is false when the draft carried an identity the store
/// had already seen. The attempt insert and its progress fold commit
/// together, so a replay can never leave the two out of step.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub attempt: Attempt,
    /// The progress document after the fold (current progress on replay)
    pub progress: Progress,
    pub newly_recorded: bool,
}

/// Storage for attempts and progress documents
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Record an attempt and fold it into the progress document as one
    /// atomic write, minting an identity if the draft has none.
    ///
    /// Recording a draft whose identity already exists returns the stored
    /// attempt and the current progress with `newly_recorded` false; the
    /// fold is applied exactly once per identity, no matter how often a
    /// caller replays it.
    async fn record_attempt(&self, draft: AttemptDraft) -> Result<AttemptRecord, StoreError>;

    /// Fetch the progress document for a pair; `None` means never played
    async fn get_progress(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<Progress>, StoreError>;

    /// Write a progress document (last writer wins)
    async fn put_progress(&self, progress: &Progress) -> Result<(), StoreError>;

    /// All progress documents for a user
    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError>;

    /// All attempts for a (user, activity) pair, in no particular order
    async fn attempts_for(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Vec<Attempt>, StoreError>;
}

/// Storage for saved game configurations
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_config(&self, id: &str) -> Result<Option<SavedConfig>, StoreError>;
    async fn put_config(&self, config: &SavedConfig) -> Result<(), StoreError>;
    async fn delete_config(&self, id: &str) -> Result<(), StoreError>;
    async fn configs_for_user(&self, owner: &str) -> Result<Vec<SavedConfig>, StoreError>;
    async fn public_configs(&self) -> Result<Vec<SavedConfig>, StoreError>;
}
