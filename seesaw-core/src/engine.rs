//! Game engine facade
//!
//! [`GameEngine`] composes the session state machine, the sync coordinator,
//! and the progress aggregator behind one `&mut self` surface, which also
//! keeps session operations from interleaving.
//!
//! Counters advance only after persistence succeeds: a balance check first
//! computes the verdict without mutating, persists the attempt (and the
//! level advance when the policy will fire), and applies the in-memory
//! transitions last. A failed primary write therefore leaves the session
//! exactly as it was, and the caller retries the whole check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, GameError, StoreError};
use crate::events::EventSink;
use crate::game::{GameConfig, GameConfigPatch, GameSession};
use crate::progress::ProgressAggregator;
use crate::store::{Attempt, AttemptDraft, Progress, ProgressStore};
use crate::sync::{RemoteSync, SyncCoordinator};

/// One player's session against one activity, with durable progress
pub struct GameEngine<S: ProgressStore> {
    session: GameSession,
    coordinator: SyncCoordinator<S>,
    aggregator: ProgressAggregator<S>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    user_id: String,
    activity_id: String,
    round_started_at: Option<DateTime<Utc>>,
    /// Identity of the check currently being persisted; held across retries
    /// so a replayed draft cannot double-record
    pending_attempt_id: Option<String>,
}

impl<S: ProgressStore> GameEngine<S> {
    pub fn new(
        config: GameConfig,
        store: Arc<S>,
        remote: Arc<dyn RemoteSync>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        user_id: impl Into<String>,
        activity_id: impl Into<String>,
    ) -> Result<Self, GameError> {
        Ok(Self {
            session: GameSession::new(config)?,
            coordinator: SyncCoordinator::new(Arc::clone(&store), remote, sink),
            aggregator: ProgressAggregator::new(store),
            clock,
            rng: StdRng::from_entropy(),
            user_id: user_id.into(),
            activity_id: activity_id.into(),
            round_started_at: None,
            pending_attempt_id: None,
        })
    }

    /// Seed the target RNG for deterministic draws
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Begin a new round and start its timer
    pub fn start_new_game(&mut self) -> Result<(), GameError> {
        self.session.start_new_game(&mut self.rng)?;
        self.round_started_at = Some(self.clock.now());
        // An abandoned check's identity must not attach to the next round
        self.pending_attempt_id = None;
        Ok(())
    }

    /// Set one addend slot
    pub fn set_addend(&mut self, index: usize, value: f64) -> Result<(), GameError> {
        self.session.set_addend(index, value)
    }

    /// Check the addends against the target, persisting before mutating.
    ///
    /// Order: pure verdict, then the attempt write and progress fold (one
    /// atomic store write, must succeed), then the level advance write when
    /// the policy will fire (must succeed), and only then the in-memory
    /// transitions. On any [`StoreError`] the session is unchanged and the
    /// whole check can be retried; the retry reuses the same attempt
    /// identity, so whatever the first try already committed is replayed
    /// rather than recorded twice.
    pub async fn check_balance(&mut self) -> Result<bool, EngineError> {
        let verdict = self.session.balance_verdict()?;
        let target = self.session.target()?;
        let now = self.clock.now();
        let time_spent = self
            .round_started_at
            .map(|started| (now - started).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        let attempt_id = self
            .pending_attempt_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        let draft = AttemptDraft {
            id: Some(attempt_id),
            user_id: self.user_id.clone(),
            activity_id: self.activity_id.clone(),
            timestamp: now,
            target,
            inputs: self.session.addends().to_vec(),
            success: verdict,
            time_spent,
        };

        let will_level_up = self.session.would_level_up(verdict);

        self.coordinator.record_attempt(draft).await?;
        if will_level_up {
            self.coordinator
                .record_level_advance(&self.user_id, &self.activity_id, self.session.level() + 1)
                .await?;
        }
        self.pending_attempt_id = None;

        // Durable; now apply the same transition in memory
        let applied = self.session.check_balance()?;
        debug_assert_eq!(applied, verdict);
        if applied {
            let leveled = self.session.evaluate_level_up();
            debug_assert_eq!(leveled, will_level_up);
        }
        debug!(
            verdict,
            attempts = self.session.attempts(),
            level = self.session.level(),
            "balance check persisted and applied"
        );

        Ok(verdict)
    }

    /// Durable progress for this (user, activity), history included
    pub async fn progress(&self) -> Result<Option<Progress>, StoreError> {
        self.aggregator
            .get_progress(&self.user_id, &self.activity_id)
            .await
    }

    /// Durable progress across all of this user's activities, history
    /// omitted
    pub async fn all_progress(&self) -> Result<Vec<Progress>, StoreError> {
        self.aggregator.get_all_progress(&self.user_id).await
    }

    /// Recent attempts as reconstructed history, newest first
    pub async fn recent_attempts(&self) -> Result<Vec<Attempt>, StoreError> {
        Ok(self
            .progress()
            .await?
            .map(|p| p.history)
            .unwrap_or_default())
    }

    /// Full session reset; durable progress is untouched
    pub fn reset(&mut self) -> Result<(), GameError> {
        self.session.reset(&mut self.rng)?;
        self.round_started_at = Some(self.clock.now());
        self.pending_attempt_id = None;
        Ok(())
    }

    /// Apply a partial configuration edit to the session
    pub fn update_config(&mut self, patch: GameConfigPatch) -> Result<(), GameError> {
        self.session.update_config(patch)
    }

    /// Read access to the in-memory session
    pub fn session(&self) -> &GameSession {
        &self.session
    }
}
