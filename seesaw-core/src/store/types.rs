//! Persisted document types
//!
//! Documents serialize in camelCase to match the secondary API's JSON
//! payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::GameConfig;

/// How many attempts a progress document keeps in its recent history
pub const HISTORY_CAP: usize = 10;

/// One immutable record of a single balance-check outcome.
///
/// Identity is assigned by the primary store on first write; the record is
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub activity_id: String,
    pub timestamp: DateTime<Utc>,
    pub target: i64,
    pub inputs: Vec<i64>,
    pub success: bool,
    /// Seconds from round start to the check
    pub time_spent: f64,
}

/// An attempt before the store has assigned its identity.
///
/// A caller retrying a failed logical operation may carry over a previously
/// minted id; replaying that id will not double-count in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDraft {
    pub id: Option<String>,
    pub user_id: String,
    pub activity_id: String,
    pub timestamp: DateTime<Utc>,
    pub target: i64,
    pub inputs: Vec<i64>,
    pub success: bool,
    pub time_spent: f64,
}

impl AttemptDraft {
    pub fn into_attempt(self, id: String) -> Attempt {
        Attempt {
            id,
            user_id: self.user_id,
            activity_id: self.activity_id,
            timestamp: self.timestamp,
            target: self.target,
            inputs: self.inputs,
            success: self.success,
            time_spent: self.time_spent,
        }
    }
}

/// Durable per-user-per-activity fold of all attempts.
///
/// Counters only grow; history holds the newest [`HISTORY_CAP`] attempts,
/// newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: String,
    pub activity_id: String,
    pub attempts: u32,
    pub successes: u32,
    pub current_level: u32,
    pub last_played: DateTime<Utc>,
    pub history: Vec<Attempt>,
}

impl Progress {
    /// Fresh progress for a pair that has never played
    pub fn new(user_id: String, activity_id: String, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            activity_id,
            attempts: 0,
            successes: 0,
            current_level: 1,
            last_played: now,
            history: Vec::new(),
        }
    }

    /// Primary-store document key for a (user, activity) pair
    pub fn key_for(user_id: &str, activity_id: &str) -> String {
        format!("{user_id}_{activity_id}")
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.user_id, &self.activity_id)
    }

    /// Fold one attempt into the counters and history.
    ///
    /// The caller guarantees each attempt identity is applied at most once;
    /// the store's insert-once discipline provides that guarantee.
    pub fn apply(&mut self, attempt: &Attempt) {
        self.attempts += 1;
        if attempt.success {
            self.successes += 1;
        }
        self.last_played = attempt.timestamp;
        self.history.insert(0, attempt.clone());
        self.history.truncate(HISTORY_CAP);
    }
}

/// Difficulty label on a saved configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// A named, shareable game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedConfig {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub game: GameConfig,
    pub is_public: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A saved configuration before ownership and timestamps are stamped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedConfigDraft {
    /// Carry an id to update an existing configuration
    pub id: Option<String>,
    pub title: String,
    pub difficulty: Difficulty,
    pub game: GameConfig,
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn attempt(id: &str, success: bool, ts: DateTime<Utc>) -> Attempt {
        Attempt {
            id: id.into(),
            user_id: "u1".into(),
            activity_id: "act1".into(),
            timestamp: ts,
            target: 10,
            inputs: vec![4, 6],
            success,
            time_spent: 3.5,
        }
    }

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, secs).unwrap()
    }

    #[test]
    fn progress_key_joins_user_and_activity() {
        assert_eq!(Progress::key_for("u1", "act1"), "u1_act1");
    }

    #[test]
    fn apply_increments_counters_and_prepends() {
        let mut progress = Progress::new("u1".into(), "act1".into(), ts(0));
        progress.apply(&attempt("a1", false, ts(1)));
        progress.apply(&attempt("a2", true, ts(2)));

        assert_eq!(progress.attempts, 2);
        assert_eq!(progress.successes, 1);
        assert_eq!(progress.last_played, ts(2));
        assert_eq!(progress.history[0].id, "a2");
        assert_eq!(progress.history[1].id, "a1");
    }

    #[test]
    fn apply_caps_history_newest_first() {
        let mut progress = Progress::new("u1".into(), "act1".into(), ts(0));
        for i in 0..15 {
            progress.apply(&attempt(&format!("a{i}"), true, ts(i)));
        }

        assert_eq!(progress.attempts, 15);
        assert_eq!(progress.history.len(), HISTORY_CAP);
        assert_eq!(progress.history[0].id, "a14");
        assert_eq!(progress.history[9].id, "a5");
    }

    #[test]
    fn difficulty_roundtrips() {
        for d in [
            Difficulty::Beginner,
            Difficulty::Intermediate,
            Difficulty::Advanced,
        ] {
            assert_eq!(Difficulty::parse(d.as_str()), Some(d));
        }
        assert_eq!(Difficulty::parse("expert"), None);
    }

    #[test]
    fn attempt_serializes_camel_case() {
        let json = serde_json::to_string(&attempt("a1", true, ts(0))).unwrap();
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"activityId\""));
        assert!(json.contains("\"timeSpent\""));
    }

    #[test]
    fn progress_serializes_camel_case() {
        let progress = Progress::new("u1".into(), "act1".into(), ts(0));
        let json = serde_json::to_string(&progress).unwrap();
        assert!(json.contains("\"currentLevel\""));
        assert!(json.contains("\"lastPlayed\""));
    }
}
