//! Shared types for the mock server: errors, status and admin results.

use super::store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockServerError {
    #[error("Port {0} is already in use")]
    PortInUse(u16),
    #[error("Failed to bind port {0}: {1}")]
    BindError(u16, String),
    #[error("Port {0} is out of range (1024-65535)")]
    InvalidPort(i64),
    #[error("Stop the server before changing its port")]
    PortChangeWhileRunning,
    #[error("Delay {0}ms is out of range (0-30000)")]
    InvalidDelay(i64),
    #[error("Status code {0} is out of range (100-599)")]
    InvalidStatusCode(i64),
    #[error("Invalid JSON response body: {0}")]
    InvalidJson(String),
    #[error("Failed to persist settings: {0}")]
    Persistence(#[from] StoreError),
}

/// Lifecycle phase of the mock listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerPhase {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub running: bool,
    /// Bound port while running, otherwise the configured port.
    pub port: u16,
    pub phase: ServerPhase,
    pub request_count: u64,
}

/// Outcome of a start request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(u16),
    AlreadyRunning(u16),
}

/// Outcome of a stop request; stopping is idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped(u16),
    NotRunning,
}

/// `{success, message?}` result handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdminResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Fold an operation result into an admin result; errors surface their
    /// display text as the message.
    pub fn from_result<T>(
        result: Result<T, MockServerError>,
        on_success: impl FnOnce(T) -> Option<String>,
    ) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                message: on_success(value),
            },
            Err(e) => Self::failure(e.to_string()),
        }
    }
}
