//! seesaw-core: engine for the seesaw arithmetic balance game
//!
//! A player supplies addends that must sum to a randomly drawn target;
//! sustained success advances a difficulty level. This crate provides:
//!
//! - **Session state machine** - [`GameSession`] owns the authoritative
//!   target and drives balance checks and level progression
//! - **Dual-backend persistence** - [`SyncCoordinator`] writes to the
//!   primary store (must succeed) and mirrors to a best-effort secondary
//! - **Progress aggregation** - [`ProgressAggregator`] rebuilds cumulative
//!   counters and a capped recent-history window
//! - **Engine facade** - [`GameEngine`] ties it together and guarantees
//!   counters advance only after persistence succeeds
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use seesaw_core::{
//!     GameConfig, GameEngine, MemoryStore, MockRemoteSync, NullEventSink, SystemClock,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let mut engine = GameEngine::new(
//!     GameConfig::default(),
//!     store,
//!     Arc::new(MockRemoteSync::new()),
//!     Arc::new(NullEventSink),
//!     Arc::new(SystemClock),
//!     "user-1",
//!     "activity-1",
//! )?;
//!
//! engine.start_new_game()?;
//! let target = engine.session().target()?;
//! engine.set_addend(0, target as f64)?;
//! let balanced = engine.check_balance().await?;
//! println!("balanced: {balanced}");
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod game;
pub mod progress;
pub mod store;
pub mod sync;

// Re-export key types for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ConfigService;
pub use engine::GameEngine;
pub use error::{
    ConfigServiceError, EngineError, GameError, RemoteSyncError, SeesawError, StoreError,
};
pub use events::{EventSink, MemoryEventSink, NullEventSink, SyncEvent};
pub use game::{
    GameConfig, GameConfigPatch, GameSession, MAX_ADDEND_SLOTS, Phase, ProgressionRules,
    ValueRange,
};
pub use progress::ProgressAggregator;
pub use store::{
    Attempt, AttemptDraft, AttemptRecord, ConfigStore, Difficulty, HISTORY_CAP, MemoryStore,
    Progress, ProgressStore, SavedConfig, SavedConfigDraft, SqliteStore,
};
pub use sync::{HttpRemoteSync, MockRemoteSync, RemotePush, RemoteSync, SyncCoordinator};
