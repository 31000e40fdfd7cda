//! Difficulty progression policy
//!
//! A pure mapping from the level just reached to the next configuration.
//! The three checks are independent and cumulative; all of them fire at
//! once on a level divisible by 3, 5, and 10.

use super::config::{GameConfig, MAX_ADDEND_SLOTS};

/// Compute the configuration for the given level.
///
/// - every 3rd level widens the value range by 5
/// - every 5th level widens the target range by 10
/// - every 10th level adds an addend slot, up to [`MAX_ADDEND_SLOTS`]
pub fn next_config(level: u32, config: &GameConfig) -> GameConfig {
    let mut next = config.clone();

    if level % 3 == 0 {
        next.value_range.max += 5;
    }

    if level % 5 == 0 {
        next.target_range.max += 10;
    }

    if level % 10 == 0 && next.max_addends < MAX_ADDEND_SLOTS {
        next.max_addends += 1;
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_not_on_boundary_changes_nothing() {
        let config = GameConfig::default();
        assert_eq!(next_config(2, &config), config);
        assert_eq!(next_config(7, &config), config);
    }

    #[test]
    fn every_third_level_widens_value_range() {
        let config = GameConfig::default();
        let next = next_config(3, &config);
        assert_eq!(next.value_range.max, config.value_range.max + 5);
        assert_eq!(next.target_range, config.target_range);
        assert_eq!(next.max_addends, config.max_addends);
    }

    #[test]
    fn every_fifth_level_widens_target_range() {
        let config = GameConfig::default();
        let next = next_config(5, &config);
        assert_eq!(next.target_range.max, config.target_range.max + 10);
        assert_eq!(next.value_range, config.value_range);
    }

    #[test]
    fn every_tenth_level_adds_addend_slot() {
        let config = GameConfig::default();
        let next = next_config(10, &config);
        assert_eq!(next.max_addends, config.max_addends + 1);
        // 10 is also divisible by 5
        assert_eq!(next.target_range.max, config.target_range.max + 10);
    }

    #[test]
    fn level_thirty_applies_all_three_deltas() {
        let config = GameConfig::default();
        let next = next_config(30, &config);
        assert_eq!(next.value_range.max, config.value_range.max + 5);
        assert_eq!(next.target_range.max, config.target_range.max + 10);
        assert_eq!(next.max_addends, config.max_addends + 1);
    }

    #[test]
    fn addend_slots_cap_at_five() {
        let config = GameConfig {
            max_addends: MAX_ADDEND_SLOTS,
            ..Default::default()
        };
        let next = next_config(10, &config);
        assert_eq!(next.max_addends, MAX_ADDEND_SLOTS);
    }

    #[test]
    fn ranges_have_no_upper_bound() {
        let mut config = GameConfig::default();
        for level in (3..=300).step_by(3) {
            config = next_config(level, &config);
        }
        assert_eq!(config.value_range.max, 10 + 5 * 100);
    }
}
