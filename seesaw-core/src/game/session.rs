//! Game session state machine
//!
//! [`GameSession`] owns the single authoritative target for the current
//! round. The target lives in one private field and every read, including
//! the balance comparison, goes through [`GameSession::target`]; there is no
//! setter that bypasses it and no second cached copy to drift out of sync.
//!
//! All operations take `&mut self`, so no two `check_balance` calls can
//! interleave on one session.

use rand::Rng;
use tracing::info;

use super::config::{GameConfig, GameConfigPatch};
use super::{progression, target};
use crate::error::GameError;

/// Where the session is in its round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No target generated yet
    Idle,
    /// A round is underway
    InProgress,
    /// Last check matched the target
    Balanced,
    /// Last check missed the target
    Unbalanced,
    /// A level advance just fired; the next round starts the new level
    LevelingUp,
}

/// Tolerance for coercing player input to the integer domain
const VALUE_TOLERANCE: f64 = 1e-4;

/// In-memory session state machine.
///
/// Cumulative attempts/successes/level persist across rounds within a
/// session; only [`GameSession::reset`] clears them.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    /// The single representation of the target. Private; read through
    /// [`GameSession::target`] only.
    target: Option<i64>,
    addends: Vec<i64>,
    attempts: u32,
    successes: u32,
    level: u32,
    phase: Phase,
    is_complete: bool,
    last_attempt_correct: Option<bool>,
}

impl GameSession {
    /// Create an idle session; no target exists until the first round starts
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let addends = vec![0; config.max_addends];
        Ok(Self {
            config,
            target: None,
            addends,
            attempts: 0,
            successes: 0,
            level: 1,
            phase: Phase::Idle,
            is_complete: false,
            last_attempt_correct: None,
        })
    }

    /// The authoritative target for the current round.
    ///
    /// This is the only way to read the target; comparisons inside the
    /// session go through it too.
    pub fn target(&self) -> Result<i64, GameError> {
        self.target.ok_or(GameError::RoundNotStarted)
    }

    /// Begin a new round: draw a fresh target and zero the addends.
    ///
    /// Cumulative attempts/successes/level carry over.
    pub fn start_new_game<R: Rng>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let target = target::generate(rng, self.config.target_range)?;
        self.target = Some(target);
        self.addends = vec![0; self.config.max_addends];
        self.is_complete = false;
        self.last_attempt_correct = None;
        self.phase = Phase::InProgress;
        Ok(())
    }

    /// Set one addend slot, coercing the value to the integer domain.
    ///
    /// Non-finite values and values more than `1e-4` away from an integer
    /// are rejected. Validation happens before any mutation.
    pub fn set_addend(&mut self, index: usize, value: f64) -> Result<(), GameError> {
        if index >= self.addends.len() {
            return Err(GameError::IndexOutOfRange {
                index,
                len: self.addends.len(),
            });
        }
        if !value.is_finite() {
            return Err(GameError::InvalidValue(value));
        }
        let rounded = value.round();
        if (value - rounded).abs() > VALUE_TOLERANCE {
            return Err(GameError::InvalidValue(value));
        }

        self.addends[index] = rounded as i64;
        // Editing after a verdict re-enters the round
        if matches!(self.phase, Phase::Balanced | Phase::Unbalanced) {
            self.phase = Phase::InProgress;
        }
        Ok(())
    }

    /// The verdict a balance check would return right now, without mutating.
    ///
    /// Exact integer comparison against the authoritative target.
    pub fn balance_verdict(&self) -> Result<bool, GameError> {
        Ok(self.sum() == self.target()?)
    }

    /// Check the addends against the target.
    ///
    /// The one place a balance verdict is decided and applied: increments
    /// `attempts`, increments `successes` iff balanced, records the verdict,
    /// and marks the round complete iff balanced.
    pub fn check_balance(&mut self) -> Result<bool, GameError> {
        let balanced = self.balance_verdict()?;

        self.attempts += 1;
        self.last_attempt_correct = Some(balanced);
        if balanced {
            self.successes += 1;
            self.is_complete = true;
            self.phase = Phase::Balanced;
        } else {
            self.phase = Phase::Unbalanced;
        }

        Ok(balanced)
    }

    /// Evaluate and apply a level advance after a successful check.
    ///
    /// Fires iff the success rate meets the required rate and the window has
    /// at least the threshold number of attempts. On fire the policy deltas
    /// are applied to the configuration, the addends sequence grows with it,
    /// and the rate window resets when the rules say so.
    pub fn evaluate_level_up(&mut self) -> bool {
        if !self.advance_fires(self.attempts, self.successes) {
            return false;
        }

        self.level += 1;
        let next = progression::next_config(self.level, &self.config);
        if next.max_addends > self.addends.len() {
            self.addends.resize(next.max_addends, 0);
        }
        self.config = next;

        if self.config.progression.reset_window_on_level_up {
            self.attempts = 0;
            self.successes = 0;
        }
        self.phase = Phase::LevelingUp;
        info!(level = self.level, "session leveled up");
        true
    }

    /// Whether a successful check right now would trigger a level advance.
    ///
    /// Used by callers that must persist the advance before applying it.
    pub fn would_level_up(&self, success: bool) -> bool {
        if !success {
            return false;
        }
        let (attempts, successes) = self.counts_after(success);
        self.advance_fires(attempts, successes)
    }

    /// Counter values as they would stand after a check with this verdict
    pub fn counts_after(&self, success: bool) -> (u32, u32) {
        (self.attempts + 1, self.successes + u32::from(success))
    }

    fn advance_fires(&self, attempts: u32, successes: u32) -> bool {
        let rules = &self.config.progression;
        attempts >= rules.advancement_threshold
            && Self::rate(attempts, successes) >= rules.required_success_rate
    }

    fn rate(attempts: u32, successes: u32) -> f64 {
        if attempts == 0 {
            return 0.0;
        }
        f64::from(successes) / f64::from(attempts) * 100.0
    }

    /// Full reset: counters and level back to 1, fresh target, addends
    /// resized to the configuration default
    pub fn reset<R: Rng>(&mut self, rng: &mut R) -> Result<(), GameError> {
        self.attempts = 0;
        self.successes = 0;
        self.level = 1;
        self.start_new_game(rng)
    }

    /// Apply a partial configuration edit, resizing addend slots to match
    pub fn update_config(&mut self, patch: GameConfigPatch) -> Result<(), GameError> {
        self.config.apply(patch)?;
        self.addends.resize(self.config.max_addends, 0);
        Ok(())
    }

    /// Sum of the current addends
    pub fn sum(&self) -> i64 {
        self.addends.iter().sum()
    }

    /// Signed distance from the target; hint material when hints are enabled
    pub fn difference(&self) -> Option<i64> {
        self.target.map(|t| self.sum() - t)
    }

    /// Success rate over the current window, as a percentage
    pub fn success_rate(&self) -> f64 {
        Self::rate(self.attempts, self.successes)
    }

    pub fn addends(&self) -> &[i64] {
        &self.addends
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn last_attempt_correct(&self) -> Option<bool> {
        self.last_attempt_correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::{ProgressionRules, ValueRange};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(17)
    }

    /// Session with the target pinned to a known value via a degenerate range
    fn session_with_target(target: i64) -> GameSession {
        let config = GameConfig {
            target_range: ValueRange::new(target, target),
            ..Default::default()
        };
        let mut session = GameSession::new(config).unwrap();
        session.start_new_game(&mut rng()).unwrap();
        session
    }

    // ==================== Lifecycle ====================

    #[test]
    fn new_session_is_idle() {
        let session = GameSession::new(GameConfig::default()).unwrap();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.level(), 1);
        assert!(matches!(session.target(), Err(GameError::RoundNotStarted)));
    }

    #[test]
    fn new_session_rejects_invalid_config() {
        let config = GameConfig {
            target_range: ValueRange::new(20, 5),
            ..Default::default()
        };
        assert!(GameSession::new(config).is_err());
    }

    #[test]
    fn start_new_game_draws_target_in_range() {
        let mut session = GameSession::new(GameConfig::default()).unwrap();
        session.start_new_game(&mut rng()).unwrap();

        let target = session.target().unwrap();
        assert!((5..=15).contains(&target));
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.addends(), &[0, 0]);
        assert!(!session.is_complete());
        assert_eq!(session.last_attempt_correct(), None);
    }

    #[test]
    fn start_new_game_keeps_cumulative_counters() {
        let mut session = session_with_target(10);
        session.set_addend(0, 4.0).unwrap();
        session.check_balance().unwrap();

        session.start_new_game(&mut rng()).unwrap();
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.level(), 1);
    }

    // ==================== set_addend ====================

    #[test]
    fn set_addend_out_of_range_index_fails() {
        let mut session = session_with_target(10);
        let err = session.set_addend(2, 1.0).unwrap_err();
        assert!(matches!(
            err,
            GameError::IndexOutOfRange { index: 2, len: 2 }
        ));
    }

    #[test]
    fn set_addend_rejects_non_finite() {
        let mut session = session_with_target(10);
        assert!(session.set_addend(0, f64::NAN).is_err());
        assert!(session.set_addend(0, f64::INFINITY).is_err());
        // Failed sets leave the slot untouched
        assert_eq!(session.addends()[0], 0);
    }

    #[test]
    fn set_addend_rejects_fractional_values() {
        let mut session = session_with_target(10);
        assert!(matches!(
            session.set_addend(0, 4.5),
            Err(GameError::InvalidValue(_))
        ));
    }

    #[test]
    fn set_addend_coerces_near_integers() {
        let mut session = session_with_target(10);
        session.set_addend(0, 4.00003).unwrap();
        assert_eq!(session.addends()[0], 4);
    }

    #[test]
    fn set_addend_after_verdict_reenters_round() {
        let mut session = session_with_target(10);
        session.check_balance().unwrap();
        assert_eq!(session.phase(), Phase::Unbalanced);

        session.set_addend(0, 10.0).unwrap();
        assert_eq!(session.phase(), Phase::InProgress);
    }

    // ==================== check_balance ====================

    #[test]
    fn check_balance_true_when_addends_sum_to_target() {
        let mut session = session_with_target(10);
        session.set_addend(0, 4.0).unwrap();
        session.set_addend(1, 6.0).unwrap();

        assert!(session.check_balance().unwrap());
        assert!(session.is_complete());
        assert_eq!(session.last_attempt_correct(), Some(true));
        assert_eq!(session.phase(), Phase::Balanced);
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.successes(), 1);
    }

    #[test]
    fn check_balance_false_when_sum_misses() {
        let mut session = session_with_target(10);
        session.set_addend(0, 4.0).unwrap();
        session.set_addend(1, 5.0).unwrap();

        assert!(!session.check_balance().unwrap());
        assert!(!session.is_complete());
        assert_eq!(session.last_attempt_correct(), Some(false));
        assert_eq!(session.phase(), Phase::Unbalanced);
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.successes(), 0);
    }

    #[test]
    fn check_balance_is_deterministic_across_reinvocations() {
        let mut session = session_with_target(10);
        session.set_addend(0, 4.0).unwrap();
        session.set_addend(1, 6.0).unwrap();

        assert!(session.check_balance().unwrap());
        assert!(session.check_balance().unwrap());
        // Verdict unchanged, attempts counted each call
        assert_eq!(session.attempts(), 2);
        assert_eq!(session.successes(), 2);
    }

    #[test]
    fn check_balance_without_round_fails() {
        let mut session = GameSession::new(GameConfig::default()).unwrap();
        assert!(matches!(
            session.check_balance(),
            Err(GameError::RoundNotStarted)
        ));
        // Validation failure never corrupts counters
        assert_eq!(session.attempts(), 0);
    }

    #[test]
    fn verdict_matches_check_balance() {
        let mut session = session_with_target(10);
        session.set_addend(0, 10.0).unwrap();
        assert!(session.balance_verdict().unwrap());
        assert!(session.check_balance().unwrap());
    }

    // ==================== Level progression ====================

    /// Run `successes` balanced checks then `misses` unbalanced ones
    fn play(session: &mut GameSession, successes: u32, misses: u32) {
        let target = session.target().unwrap() as f64;
        for _ in 0..misses {
            session.set_addend(0, 0.0).unwrap();
            assert!(!session.check_balance().unwrap());
        }
        for _ in 0..successes {
            session.set_addend(0, target).unwrap();
            assert!(session.check_balance().unwrap());
        }
    }

    #[test]
    fn level_up_fires_at_eighty_percent_of_five() {
        let mut session = session_with_target(10);
        play(&mut session, 4, 1); // 4/5 = 80%
        assert!(session.evaluate_level_up());
        assert_eq!(session.level(), 2);
        assert_eq!(session.phase(), Phase::LevelingUp);
    }

    #[test]
    fn level_up_does_not_fire_at_sixty_percent() {
        let mut session = session_with_target(10);
        play(&mut session, 3, 2); // 3/5 = 60%
        assert!(!session.evaluate_level_up());
        assert_eq!(session.level(), 1);
    }

    #[test]
    fn level_up_does_not_fire_below_attempt_threshold() {
        let mut session = session_with_target(10);
        play(&mut session, 4, 0); // 100% but only 4 attempts
        assert!(!session.evaluate_level_up());
    }

    #[test]
    fn level_up_resets_rate_window() {
        let mut session = session_with_target(10);
        play(&mut session, 5, 0);
        assert!(session.evaluate_level_up());
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.successes(), 0);
    }

    #[test]
    fn level_up_keeps_window_when_rule_disabled() {
        let config = GameConfig {
            target_range: ValueRange::new(10, 10),
            progression: ProgressionRules {
                reset_window_on_level_up: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = GameSession::new(config).unwrap();
        session.start_new_game(&mut rng()).unwrap();
        play(&mut session, 5, 0);
        assert!(session.evaluate_level_up());
        assert_eq!(session.attempts(), 5);
        assert_eq!(session.successes(), 5);
    }

    #[test]
    fn reaching_level_ten_grows_addend_slots() {
        let mut session = session_with_target(10);
        // Drive the level from 1 to 10
        for _ in 0..9 {
            play(&mut session, 5, 0);
            assert!(session.evaluate_level_up());
        }
        assert_eq!(session.level(), 10);
        assert_eq!(session.config().max_addends, 3);
        assert_eq!(session.addends().len(), 3);
    }

    #[test]
    fn would_level_up_previews_without_mutating() {
        let mut session = session_with_target(10);
        play(&mut session, 4, 0);
        let target = session.target().unwrap() as f64;
        session.set_addend(0, target).unwrap();

        // 5th attempt, all successes: a success now fires
        assert!(session.would_level_up(true));
        assert!(!session.would_level_up(false));
        assert_eq!(session.attempts(), 4);
        assert_eq!(session.level(), 1);
    }

    // ==================== Conveniences ====================

    #[test]
    fn sum_and_difference_track_addends() {
        let mut session = session_with_target(10);
        session.set_addend(0, 4.0).unwrap();
        session.set_addend(1, 3.0).unwrap();
        assert_eq!(session.sum(), 7);
        assert_eq!(session.difference(), Some(-3));
    }

    #[test]
    fn difference_is_none_when_idle() {
        let session = GameSession::new(GameConfig::default()).unwrap();
        assert_eq!(session.difference(), None);
    }

    #[test]
    fn success_rate_is_zero_with_no_attempts() {
        let session = GameSession::new(GameConfig::default()).unwrap();
        assert_eq!(session.success_rate(), 0.0);
    }

    #[test]
    fn reset_clears_counters_and_level() {
        let mut session = session_with_target(10);
        play(&mut session, 5, 0);
        session.evaluate_level_up();
        assert_eq!(session.level(), 2);

        session.reset(&mut rng()).unwrap();
        assert_eq!(session.level(), 1);
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.successes(), 0);
        assert_eq!(session.phase(), Phase::InProgress);
        assert!(session.target().is_ok());
    }

    #[test]
    fn update_config_resizes_addends() {
        let mut session = session_with_target(10);
        session
            .update_config(GameConfigPatch {
                max_addends: Some(4),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(session.addends().len(), 4);

        session
            .update_config(GameConfigPatch {
                max_addends: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(session.addends().len(), 2);
    }

    #[test]
    fn update_config_rejects_invalid_patch() {
        let mut session = session_with_target(10);
        let result = session.update_config(GameConfigPatch {
            max_addends: Some(9),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(session.addends().len(), 2);
    }
}
