//! HTTP implementation of the secondary store

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::remote::RemoteSync;
use crate::error::RemoteSyncError;
use crate::store::{Attempt, Progress, SavedConfig};

/// Bound on any single request to the secondary API. The coordinator never
/// awaits the mirror, but a hanging request would still pin a task forever
/// without this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Secondary store backed by the game's HTTP API
pub struct HttpRemoteSync {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpRemoteSync {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteSyncError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<(), RemoteSyncError> {
        let mut request = self.client.post(self.url(path)).json(payload);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(RemoteSyncError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), RemoteSyncError> {
        let mut request = self.client.delete(self.url(path));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(RemoteSyncError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSync for HttpRemoteSync {
    async fn push_attempt(&self, attempt: &Attempt) -> Result<(), RemoteSyncError> {
        self.post("/api/game/sessions/current/attempts", attempt)
            .await
    }

    async fn push_progress(&self, progress: &Progress) -> Result<(), RemoteSyncError> {
        self.post("/api/game/progress", progress).await
    }

    async fn push_config(&self, config: &SavedConfig) -> Result<(), RemoteSyncError> {
        self.post("/api/game/configurations", config).await
    }

    async fn delete_config(&self, id: &str) -> Result<(), RemoteSyncError> {
        self.delete(&format!("/api/game/configurations/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let remote = HttpRemoteSync::new("https://api.example.com/").unwrap();
        assert_eq!(
            remote.url("/api/game/progress"),
            "https://api.example.com/api/game/progress"
        );
    }

    #[test]
    fn url_joins_without_trailing_slash() {
        let remote = HttpRemoteSync::new("https://api.example.com").unwrap();
        assert_eq!(
            remote.url("/api/game/progress"),
            "https://api.example.com/api/game/progress"
        );
    }

    #[tokio::test]
    async fn unreachable_remote_fails_instead_of_hanging() {
        // Reserved TEST-NET address; connection should fail fast or time out
        let remote = HttpRemoteSync::new("http://192.0.2.1:9");
        let remote = remote.unwrap();
        let result = remote.delete_config("c1").await;
        assert!(result.is_err());
    }
}
