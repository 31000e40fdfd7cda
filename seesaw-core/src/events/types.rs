//! Event types emitted by the persistence layer

use serde::{Deserialize, Serialize};

/// Events published by the sync coordinator and config service.
///
/// Absorbed secondary-store failures are only observable here and in the
/// logs; they never surface to callers as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// An attempt was durably recorded in the primary store
    AttemptRecorded {
        attempt_id: String,
        user_id: String,
        activity_id: String,
        success: bool,
    },

    /// A progress document was written to the primary store
    ProgressSaved {
        user_id: String,
        activity_id: String,
        attempts: u32,
        successes: u32,
    },

    /// A level advance was durably recorded
    LevelAdvanced {
        user_id: String,
        activity_id: String,
        level: u32,
    },

    /// A saved configuration was written to the primary store
    ConfigSaved { config_id: String },

    /// A saved configuration was deleted from the primary store
    ConfigDeleted { config_id: String },

    /// A best-effort write to the secondary store failed and was absorbed
    RemoteSyncFailed { operation: String, reason: String },
}
