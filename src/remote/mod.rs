// ABOUTME: Remote NAS API module: typed client plus the seam the orchestrator calls through
// ABOUTME: SystemApi abstracts one host endpoint so tests can substitute recording fakes

pub mod client;
pub mod models;

pub use client::NasClient;
pub use models::{EpochMillis, ReplicationTask, TaskState, TaskStatus};

use async_trait::async_trait;

use crate::error::BackupError;

/// The operations this tool performs against a single NAS host.
///
/// Transport failures are folded into each operation's degraded return value
/// where the workflow treats them as retryable (readiness, status), and into
/// typed errors where the caller must decide (discovery, trigger, shutdown).
#[async_trait]
pub trait SystemApi: Send + Sync {
    /// Readiness probe; any failure counts as "not ready".
    async fn is_system_ready(&self) -> bool;

    /// All replication tasks whose name appears in `name_filter`, in
    /// discovery order.
    async fn list_replication_tasks(
        &self,
        name_filter: &[String],
    ) -> Result<Vec<ReplicationTask>, BackupError>;

    /// One task by id; `None` whenever the API cannot serve it right now.
    async fn get_replication_task(&self, id: i64) -> Option<ReplicationTask>;

    /// Asks the backend to run a task. Does not wait for completion.
    async fn trigger_replication_task(&self, id: i64) -> Result<(), BackupError>;

    /// Requests a system power-off.
    async fn shutdown_system(&self) -> Result<(), BackupError>;
}
