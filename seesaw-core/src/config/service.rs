//! Saved configuration service
//!
//! Users save, share, and delete named game configurations. Writes follow
//! the same dual-backend discipline as progress: the primary store must
//! succeed, the secondary mirror is detached best-effort.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ConfigServiceError;
use crate::events::{EventSink, SyncEvent};
use crate::store::{ConfigStore, SavedConfig, SavedConfigDraft};
use crate::sync::RemoteSync;

/// Manages saved game configurations
pub struct ConfigService<S: ConfigStore> {
    store: Arc<S>,
    remote: Arc<dyn RemoteSync>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl<S: ConfigStore> ConfigService<S> {
    pub fn new(
        store: Arc<S>,
        remote: Arc<dyn RemoteSync>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            remote,
            sink,
            clock,
        }
    }

    /// Save a configuration, stamping ownership and timestamps.
    ///
    /// A draft carrying a known id updates the existing configuration,
    /// preserving its creation timestamp.
    pub async fn save(
        &self,
        draft: SavedConfigDraft,
        owner: &str,
    ) -> Result<SavedConfig, ConfigServiceError> {
        draft.game.validate()?;

        let now = self.clock.now();
        let id = draft.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let created_at = match self.store.get_config(&id).await? {
            Some(existing) => existing.created_at,
            None => now,
        };

        let config = SavedConfig {
            id,
            title: draft.title,
            difficulty: draft.difficulty,
            game: draft.game,
            is_public: draft.is_public,
            created_by: owner.to_string(),
            created_at,
            updated_at: now,
        };

        self.store.put_config(&config).await?;
        self.sink
            .publish(SyncEvent::ConfigSaved {
                config_id: config.id.clone(),
            })
            .await;

        self.mirror_save(config.clone());
        Ok(config)
    }

    /// Fetch a configuration; unlike progress, absence here is an error
    pub async fn get(&self, id: &str) -> Result<SavedConfig, ConfigServiceError> {
        self.store
            .get_config(id)
            .await?
            .ok_or_else(|| ConfigServiceError::NotFound(id.to_string()))
    }

    /// All configurations owned by a user
    pub async fn list_for_user(&self, owner: &str) -> Result<Vec<SavedConfig>, ConfigServiceError> {
        Ok(self.store.configs_for_user(owner).await?)
    }

    /// All publicly shared configurations
    pub async fn list_public(&self) -> Result<Vec<SavedConfig>, ConfigServiceError> {
        Ok(self.store.public_configs().await?)
    }

    /// Delete a configuration; only its owner may do so
    pub async fn delete(&self, id: &str, requester: &str) -> Result<(), ConfigServiceError> {
        let config = self
            .store
            .get_config(id)
            .await?
            .ok_or_else(|| ConfigServiceError::NotFound(id.to_string()))?;

        if config.created_by != requester {
            return Err(ConfigServiceError::NotOwner(id.to_string()));
        }

        self.store.delete_config(id).await?;
        self.sink
            .publish(SyncEvent::ConfigDeleted {
                config_id: id.to_string(),
            })
            .await;

        self.mirror_delete(id.to_string());
        Ok(())
    }

    fn mirror_save(&self, config: SavedConfig) {
        let remote = Arc::clone(&self.remote);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = remote.push_config(&config).await {
                warn!(error = %e, "failed to sync configuration with remote");
                sink.publish(SyncEvent::RemoteSyncFailed {
                    operation: "push_config".into(),
                    reason: e.to_string(),
                })
                .await;
            }
        });
    }

    fn mirror_delete(&self, id: String) {
        let remote = Arc::clone(&self.remote);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = remote.delete_config(&id).await {
                warn!(error = %e, "failed to delete configuration from remote");
                sink.publish(SyncEvent::RemoteSyncFailed {
                    operation: "delete_config".into(),
                    reason: e.to_string(),
                })
                .await;
            }
        });
    }
}
