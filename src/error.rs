// ABOUTME: Custom error types for the backup orchestrator
// ABOUTME: Provides context-specific error variants with actionable messages

use std::fmt;

#[derive(Debug)]
pub enum BackupError {
    InvalidAddress(String),
    Network(String),
    Api { status: u16, body: String },
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BackupError::InvalidAddress(msg) => write!(f, "Invalid hardware address: {}", msg),
            BackupError::Network(msg) => write!(f, "Network error: {}", msg),
            BackupError::Api { status, body } => {
                write!(f, "API error: status={}, body={}", status, body)
            }
        }
    }
}

impl std::error::Error for BackupError {}

impl From<reqwest::Error> for BackupError {
    fn from(err: reqwest::Error) -> Self {
        BackupError::Network(err.to_string())
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        BackupError::Network(err.to_string())
    }
}
