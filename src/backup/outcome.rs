// ABOUTME: Terminal outcome of a backup run: stable code, notification title, message
// ABOUTME: Exactly one RunOutcome is produced per invocation, partial results included

use std::time::Duration;

use crate::error::BackupError;

/// Mutually exclusive terminal outcome codes for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCode {
    Success,
    SourceNotReady,
    WakeFailed,
    WakeTimeout,
    DiscoveryFailed,
    MonitorTimeout,
    ShutdownFailed,
}

impl OutcomeCode {
    /// Stable numeric code; doubles as the process exit code.
    pub fn as_code(self) -> u8 {
        match self {
            OutcomeCode::Success => 0,
            OutcomeCode::SourceNotReady => 1,
            OutcomeCode::WakeFailed => 2,
            OutcomeCode::WakeTimeout => 3,
            OutcomeCode::DiscoveryFailed => 4,
            OutcomeCode::MonitorTimeout => 5,
            OutcomeCode::ShutdownFailed => 6,
        }
    }

    /// Short stable label (snake_case) for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            OutcomeCode::Success => "success",
            OutcomeCode::SourceNotReady => "source_not_ready",
            OutcomeCode::WakeFailed => "wake_signal_failed",
            OutcomeCode::WakeTimeout => "destination_wake_timeout",
            OutcomeCode::DiscoveryFailed => "task_discovery_failed",
            OutcomeCode::MonitorTimeout => "monitoring_timeout",
            OutcomeCode::ShutdownFailed => "shutdown_failed",
        }
    }
}

/// The single externally visible result of a backup run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub code: OutcomeCode,
    pub title: String,
    pub message: String,
}

impl RunOutcome {
    pub fn source_not_ready() -> Self {
        Self {
            code: OutcomeCode::SourceNotReady,
            title: "NAS backup aborted".to_string(),
            message: "source system not ready, run aborted".to_string(),
        }
    }

    pub fn discovery_failed(err: &BackupError) -> Self {
        Self {
            code: OutcomeCode::DiscoveryFailed,
            title: "NAS backup aborted".to_string(),
            message: format!("failed to list replication tasks: {}", err),
        }
    }

    pub fn wake_failed(err: &BackupError) -> Self {
        Self {
            code: OutcomeCode::WakeFailed,
            title: "NAS backup aborted".to_string(),
            message: format!("wake-on-LAN send failed: {}", err),
        }
    }

    pub fn wake_timeout(budget: Duration) -> Self {
        Self {
            code: OutcomeCode::WakeTimeout,
            title: "NAS backup aborted".to_string(),
            message: format!(
                "destination system did not become ready within {}s of the wake signal",
                budget.as_secs()
            ),
        }
    }

    /// Carries only the lines of tasks that did reach a terminal state, so a
    /// reader can tell partial completion from nothing having run.
    pub fn monitor_timeout(status_lines: &[String]) -> Self {
        Self {
            code: OutcomeCode::MonitorTimeout,
            title: "Backup task monitoring timed out".to_string(),
            message: status_lines.join("\n"),
        }
    }

    pub fn shutdown_failed(status_lines: &[String]) -> Self {
        Self {
            code: OutcomeCode::ShutdownFailed,
            title: "Destination shutdown failed".to_string(),
            message: status_lines.join("\n"),
        }
    }

    pub fn success(status_lines: &[String]) -> Self {
        Self {
            code: OutcomeCode::Success,
            title: "NAS backup finished".to_string(),
            message: status_lines.join("\n"),
        }
    }
}
