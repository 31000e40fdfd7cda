//! Error types for seesaw-core

use thiserror::Error;

/// Top-level error type for seesaw-core
#[derive(Error, Debug)]
pub enum SeesawError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Remote sync error: {0}")]
    RemoteSync(#[from] RemoteSyncError),

    #[error("Config service error: {0}")]
    ConfigService(#[from] ConfigServiceError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Validation errors from game state machine operations.
///
/// These are synchronous and non-retryable: the caller must correct its
/// input. A failed operation never mutates session state.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: i64, max: i64 },

    #[error("Addend index {index} out of range (have {len} addends)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid addend value: {0}")]
    InvalidValue(f64),

    #[error("No round in progress; call start_new_game first")]
    RoundNotStarted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from the primary document store.
///
/// Propagated to the caller; the caller retries the whole logical
/// operation. Session state is left intact by the engine on failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

/// Errors from the secondary best-effort store.
///
/// Never propagated past the sync coordinator: absorbed, logged, and
/// published to the event sink for observability.
#[derive(Error, Debug)]
pub enum RemoteSyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned status {0}")]
    Status(u16),

    #[error("Remote sync unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the saved-configuration service
#[derive(Error, Debug)]
pub enum ConfigServiceError {
    #[error("Configuration not found: {0}")]
    NotFound(String),

    #[error("Not the owner of configuration {0}")]
    NotOwner(String),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors surfaced by the game engine facade
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
