//! Progress aggregation over the primary store

use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{HISTORY_CAP, Progress, ProgressStore};

/// Reads cumulative progress and reconstructs the recent-history window
/// from the attempt records themselves.
pub struct ProgressAggregator<S: ProgressStore> {
    store: Arc<S>,
    history_cap: usize,
}

impl<S: ProgressStore> ProgressAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            history_cap: HISTORY_CAP,
        }
    }

    /// Progress for one (user, activity) pair.
    ///
    /// `None` means never played, not an error. When present, the history
    /// window is rebuilt by querying the attempts for the pair, sorting
    /// newest first, and truncating to the cap; store rows whose timestamps
    /// failed to parse carry the epoch and so sort last rather than failing
    /// the read.
    pub async fn get_progress(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<Progress>, StoreError> {
        let Some(mut progress) = self.store.get_progress(user_id, activity_id).await? else {
            return Ok(None);
        };

        let mut attempts = self.store.attempts_for(user_id, activity_id).await?;
        attempts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        attempts.truncate(self.history_cap);
        progress.history = attempts;

        Ok(Some(progress))
    }

    /// All progress documents for a user, history omitted for performance.
    ///
    /// Callers needing history fetch it per activity via
    /// [`ProgressAggregator::get_progress`].
    pub async fn get_all_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError> {
        let mut all = self.store.list_progress(user_id).await?;
        for progress in &mut all {
            progress.history = Vec::new();
        }
        Ok(all)
    }
}
