//! SQLite-backed primary store

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::migrations;
use super::types::{Attempt, AttemptDraft, Difficulty, Progress, SavedConfig};
use super::{AttemptRecord, ConfigStore, ProgressStore};
use crate::error::StoreError;

/// SQLite implementation of the store traits.
///
/// Timestamps are stored as RFC 3339 text. Rows with unparseable timestamps
/// map to the epoch so they sort last in newest-first views instead of
/// failing the whole read.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create database at path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Run migrations
    fn init(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        migrations::run(&conn)
    }

    fn parse_timestamp(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
        serde_json::to_string(value).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn from_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, StoreError> {
        serde_json::from_str(s).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn row_to_attempt(row: &rusqlite::Row) -> Result<Attempt, rusqlite::Error> {
        let timestamp: String = row.get(3)?;
        let inputs_json: String = row.get(5)?;
        Ok(Attempt {
            id: row.get(0)?,
            user_id: row.get(1)?,
            activity_id: row.get(2)?,
            timestamp: Self::parse_timestamp(&timestamp),
            target: row.get(4)?,
            inputs: serde_json::from_str(&inputs_json).unwrap_or_default(),
            success: row.get(6)?,
            time_spent: row.get(7)?,
        })
    }

    fn row_to_progress(row: &rusqlite::Row) -> Result<Progress, rusqlite::Error> {
        let last_played: String = row.get(5)?;
        let history_json: String = row.get(6)?;
        Ok(Progress {
            user_id: row.get(0)?,
            activity_id: row.get(1)?,
            attempts: row.get(2)?,
            successes: row.get(3)?,
            current_level: row.get(4)?,
            last_played: Self::parse_timestamp(&last_played),
            history: serde_json::from_str(&history_json).unwrap_or_default(),
        })
    }

    fn row_to_config(row: &rusqlite::Row) -> Result<SavedConfig, rusqlite::Error> {
        let difficulty: String = row.get(2)?;
        let game_json: String = row.get(3)?;
        let created_at: String = row.get(6)?;
        let updated_at: String = row.get(7)?;
        Ok(SavedConfig {
            id: row.get(0)?,
            title: row.get(1)?,
            difficulty: Difficulty::parse(&difficulty).unwrap_or(Difficulty::Beginner),
            game: serde_json::from_str(&game_json).unwrap_or_default(),
            is_public: row.get(4)?,
            created_by: row.get(5)?,
            created_at: Self::parse_timestamp(&created_at),
            updated_at: Self::parse_timestamp(&updated_at),
        })
    }

    fn load_attempt(conn: &Connection, id: &str) -> Result<Option<Attempt>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, activity_id, timestamp, target, inputs, success, time_spent
             FROM attempts WHERE id = ?1",
        )?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_attempt(row)?)),
            None => Ok(None),
        }
    }

    fn store_attempt(conn: &Connection, attempt: &Attempt) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO attempts (id, user_id, activity_id, timestamp, target, inputs, success, time_spent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                attempt.id,
                attempt.user_id,
                attempt.activity_id,
                attempt.timestamp.to_rfc3339(),
                attempt.target,
                Self::to_json(&attempt.inputs)?,
                attempt.success,
                attempt.time_spent,
            ],
        )?;
        Ok(())
    }

    fn load_progress(
        conn: &Connection,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<Progress>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT user_id, activity_id, attempts, successes, current_level, last_played, history
             FROM progress WHERE user_id = ?1 AND activity_id = ?2",
        )?;
        let mut rows = stmt.query([user_id, activity_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_progress(row)?)),
            None => Ok(None),
        }
    }

    fn store_progress(conn: &Connection, progress: &Progress) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO progress (user_id, activity_id, attempts, successes, current_level, last_played, history)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id, activity_id) DO UPDATE SET
                attempts = excluded.attempts,
                successes = excluded.successes,
                current_level = excluded.current_level,
                last_played = excluded.last_played,
                history = excluded.history",
            rusqlite::params![
                progress.user_id,
                progress.activity_id,
                progress.attempts,
                progress.successes,
                progress.current_level,
                progress.last_played.to_rfc3339(),
                Self::to_json(&progress.history)?,
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn record_attempt(&self, draft: AttemptDraft) -> Result<AttemptRecord, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        // Insert and fold commit in one transaction; a failure rolls both
        // back, so a retry with the same identity starts clean
        let tx = conn.transaction()?;

        if let Some(id) = &draft.id {
            if let Some(attempt) = Self::load_attempt(&tx, id)? {
                let progress = Self::load_progress(&tx, &attempt.user_id, &attempt.activity_id)?
                    .unwrap_or_else(|| {
                        Progress::new(
                            attempt.user_id.clone(),
                            attempt.activity_id.clone(),
                            attempt.timestamp,
                        )
                    });
                return Ok(AttemptRecord {
                    attempt,
                    progress,
                    newly_recorded: false,
                });
            }
        }

        let id = draft
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let attempt = draft.into_attempt(id);
        Self::store_attempt(&tx, &attempt)?;

        let mut progress = Self::load_progress(&tx, &attempt.user_id, &attempt.activity_id)?
            .unwrap_or_else(|| {
                Progress::new(
                    attempt.user_id.clone(),
                    attempt.activity_id.clone(),
                    attempt.timestamp,
                )
            });
        progress.apply(&attempt);
        Self::store_progress(&tx, &progress)?;
        tx.commit()?;

        Ok(AttemptRecord {
            attempt,
            progress,
            newly_recorded: true,
        })
    }

    async fn get_progress(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<Progress>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::load_progress(&conn, user_id, activity_id)
    }

    async fn put_progress(&self, progress: &Progress) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::store_progress(&conn, progress)
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, activity_id, attempts, successes, current_level, last_played, history
             FROM progress WHERE user_id = ?1",
        )?;
        let rows = stmt.query_map([user_id], |row| Self::row_to_progress(row))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn attempts_for(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, activity_id, timestamp, target, inputs, success, time_spent
             FROM attempts WHERE user_id = ?1 AND activity_id = ?2",
        )?;
        let rows = stmt.query_map([user_id, activity_id], |row| Self::row_to_attempt(row))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl ConfigStore for SqliteStore {
    async fn get_config(&self, id: &str) -> Result<Option<SavedConfig>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, difficulty, game, is_public, created_by, created_at, updated_at
             FROM configurations WHERE id = ?1",
        )?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_config(row)?)),
            None => Ok(None),
        }
    }

    async fn put_config(&self, config: &SavedConfig) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO configurations (id, title, difficulty, game, is_public, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                difficulty = excluded.difficulty,
                game = excluded.game,
                is_public = excluded.is_public,
                created_by = excluded.created_by,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
            rusqlite::params![
                config.id,
                config.title,
                config.difficulty.as_str(),
                Self::to_json(&config.game)?,
                config.is_public,
                config.created_by,
                config.created_at.to_rfc3339(),
                config.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn delete_config(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM configurations WHERE id = ?1", [id])?;
        Ok(())
    }

    async fn configs_for_user(&self, owner: &str) -> Result<Vec<SavedConfig>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, difficulty, game, is_public, created_by, created_at, updated_at
             FROM configurations WHERE created_by = ?1",
        )?;
        let rows = stmt.query_map([owner], |row| Self::row_to_config(row))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn public_configs(&self) -> Result<Vec<SavedConfig>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, difficulty, game, is_public, created_by, created_at, updated_at
             FROM configurations WHERE is_public = 1",
        )?;
        let rows = stmt.query_map([], |row| Self::row_to_config(row))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
