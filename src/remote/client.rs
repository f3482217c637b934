// ABOUTME: HTTP client for the TrueNAS-style system and replication API
// ABOUTME: Handles readiness probes, task discovery, triggering, and shutdown

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::config::HostEndpoint;
use crate::error::BackupError;
use tracing::{debug, info};

use super::models::ReplicationTask;
use super::SystemApi;

/// Readiness, discovery, status, and shutdown calls must answer fast.
const READ_TIMEOUT: Duration = Duration::from_secs(2);
/// Triggering a run can block while the backend queues the job.
const TRIGGER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct NasClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NasClient {
    pub fn new(endpoint: &HostEndpoint) -> Result<Self> {
        let client = Client::builder()
            .timeout(READ_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            api_key: endpoint.api_key.clone(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

#[async_trait]
impl SystemApi for NasClient {
    async fn is_system_ready(&self) -> bool {
        let url = format!("{}/system/ready", self.base_url);

        let response = match self.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(%url, error = %err, "readiness probe failed");
                return false;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(%url, status = %response.status(), "readiness probe rejected");
            return false;
        }

        matches!(response.json::<bool>().await, Ok(true))
    }

    async fn list_replication_tasks(
        &self,
        name_filter: &[String],
    ) -> Result<Vec<ReplicationTask>, BackupError> {
        let url = format!("{}/replication", self.base_url);

        let response = self.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackupError::Api { status, body });
        }

        let tasks: Vec<ReplicationTask> = response.json().await?;

        let mut matched = Vec::new();
        for task in tasks {
            if name_filter.iter().any(|name| name == &task.name) {
                info!(id = task.id, name = %task.name, "found replication task");
                matched.push(task);
            }
        }
        Ok(matched)
    }

    async fn get_replication_task(&self, id: i64) -> Option<ReplicationTask> {
        let url = format!("{}/replication/id/{}", self.base_url, id);

        let response = match self.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(id, error = %err, "task status request failed");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(id, status = %response.status(), "task status not available");
            return None;
        }

        match response.json().await {
            Ok(task) => Some(task),
            Err(err) => {
                debug!(id, error = %err, "task status body unreadable");
                None
            }
        }
    }

    async fn trigger_replication_task(&self, id: i64) -> Result<(), BackupError> {
        let url = format!("{}/replication/id/{}/run", self.base_url, id);

        let response = self.post(&url).timeout(TRIGGER_TIMEOUT).send().await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackupError::Api { status, body });
        }
        Ok(())
    }

    async fn shutdown_system(&self) -> Result<(), BackupError> {
        let url = format!("{}/system/shutdown", self.base_url);

        let response = self.post(&url).send().await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackupError::Api { status, body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(base_url: &str) -> HostEndpoint {
        HostEndpoint {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = NasClient::new(&endpoint("http://192.168.1.3/api/v2.0"));
        assert!(client.is_ok());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = NasClient::new(&endpoint("http://192.168.1.3/api/v2.0/")).unwrap();
        assert_eq!(client.base_url, "http://192.168.1.3/api/v2.0");
    }
}
