//! Target generation
//!
//! The random source is injected so tests can seed it; nothing here touches
//! the global RNG.

use rand::Rng;

use super::config::ValueRange;
use crate::error::GameError;

/// Draw a target uniformly from the inclusive integer range.
///
/// The only side effect is consuming entropy from `rng`.
pub fn generate<R: Rng>(rng: &mut R, range: ValueRange) -> Result<i64, GameError> {
    range.validate()?;
    Ok(rng.gen_range(range.min..=range.max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn generate_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = ValueRange::new(5, 15);
        for _ in 0..10_000 {
            let target = generate(&mut rng, range).unwrap();
            assert!(range.contains(target), "target {target} out of range");
        }
    }

    #[test]
    fn generate_covers_every_value() {
        let mut rng = StdRng::seed_from_u64(42);
        let range = ValueRange::new(1, 10);
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            seen.insert(generate(&mut rng, range).unwrap());
        }
        // Uniform draws over ten values must hit all of them, endpoints included
        for value in range.min..=range.max {
            assert!(seen.contains(&value), "value {value} never drawn");
        }
    }

    #[test]
    fn generate_degenerate_range_pins_target() {
        let mut rng = StdRng::seed_from_u64(0);
        let target = generate(&mut rng, ValueRange::new(9, 9)).unwrap();
        assert_eq!(target, 9);
    }

    #[test]
    fn generate_inverted_range_fails() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = generate(&mut rng, ValueRange::new(10, 1));
        assert!(matches!(result, Err(GameError::InvalidRange { .. })));
    }

    #[test]
    fn generate_handles_negative_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let range = ValueRange::new(-5, 5);
        for _ in 0..1_000 {
            assert!(range.contains(generate(&mut rng, range).unwrap()));
        }
    }
}
