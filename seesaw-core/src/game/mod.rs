//! Game state machine, configuration, and difficulty progression

mod config;
mod progression;
mod session;
mod target;

pub use config::{GameConfig, GameConfigPatch, MAX_ADDEND_SLOTS, ProgressionRules, ValueRange};
pub use progression::next_config;
pub use session::{GameSession, Phase};
pub use target::generate;
