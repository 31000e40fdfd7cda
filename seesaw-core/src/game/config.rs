//! Game configuration types

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Hard cap on the number of addend slots, regardless of level
pub const MAX_ADDEND_SLOTS: usize = 5;

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: i64,
    pub max: i64,
}

impl ValueRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// A range with min above max is a configuration error
    pub fn validate(&self) -> Result<(), GameError> {
        if self.min > self.max {
            return Err(GameError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Rules governing when a level advance fires.
///
/// The window reset on level-up is a product-policy choice, so it is a rule
/// rather than hard-coded behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRules {
    /// Success rate (percent) required to advance
    pub required_success_rate: f64,
    /// Minimum attempts in the window before an advance can fire
    pub advancement_threshold: u32,
    /// Whether the attempts/successes window resets to zero on advance
    pub reset_window_on_level_up: bool,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            required_success_rate: 80.0,
            advancement_threshold: 5,
            reset_window_on_level_up: true,
        }
    }
}

/// Configuration for a game session.
///
/// Mutated only by the progression policy or an explicit user edit via
/// [`GameConfig::apply`]; owned by the session for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Range addend values are expected to come from
    pub value_range: ValueRange,
    /// Number of addend slots (1 to [`MAX_ADDEND_SLOTS`])
    pub max_addends: usize,
    /// Range the target is drawn from
    pub target_range: ValueRange,
    /// Optional round time limit in seconds
    pub time_limit: Option<u32>,
    /// Whether hint material (the running difference) is offered
    pub hints_enabled: bool,
    /// Level advancement rules
    pub progression: ProgressionRules,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            value_range: ValueRange::new(1, 10),
            max_addends: 2,
            target_range: ValueRange::new(5, 15),
            time_limit: None,
            hints_enabled: true,
            progression: ProgressionRules::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        self.value_range.validate()?;
        self.target_range.validate()?;
        if self.max_addends == 0 || self.max_addends > MAX_ADDEND_SLOTS {
            return Err(GameError::InvalidConfig(format!(
                "max_addends must be between 1 and {}, got {}",
                MAX_ADDEND_SLOTS, self.max_addends
            )));
        }
        Ok(())
    }

    /// Apply a partial edit, re-validating before mutating.
    ///
    /// On error the configuration is unchanged.
    pub fn apply(&mut self, patch: GameConfigPatch) -> Result<(), GameError> {
        let mut next = self.clone();
        if let Some(value_range) = patch.value_range {
            next.value_range = value_range;
        }
        if let Some(max_addends) = patch.max_addends {
            next.max_addends = max_addends;
        }
        if let Some(target_range) = patch.target_range {
            next.target_range = target_range;
        }
        if let Some(time_limit) = patch.time_limit {
            next.time_limit = time_limit;
        }
        if let Some(hints_enabled) = patch.hints_enabled {
            next.hints_enabled = hints_enabled;
        }
        if let Some(progression) = patch.progression {
            next.progression = progression;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Partial edit to a [`GameConfig`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfigPatch {
    pub value_range: Option<ValueRange>,
    pub max_addends: Option<usize>,
    pub target_range: Option<ValueRange>,
    /// `Some(None)` clears the time limit
    pub time_limit: Option<Option<u32>>,
    pub hints_enabled: Option<bool>,
    pub progression: Option<ProgressionRules>,
}
