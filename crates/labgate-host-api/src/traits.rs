//! Host adapter traits

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Stop failed: {0}")]
    StopFailed(String),

    #[error("Liveness probe failed: {0}")]
    ProbeFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Stop mode for session termination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Try graceful stop with timeout, then force
    Graceful { timeout: Duration },
    /// Force immediate termination
    Force,
}

impl Default for StopMode {
    fn default() -> Self {
        Self::Graceful {
            timeout: Duration::from_secs(5),
        }
    }
}

/// The external process backing a session.
///
/// It exposes no notification channel, so the monitor polls
/// [`is_alive`](SessionProcess::is_alive).
#[async_trait]
pub trait SessionProcess: Send + Sync {
    /// Short description for logs (e.g. "pid 1234")
    fn describe(&self) -> String;

    /// Liveness probe: `Ok(false)` once the process/window is gone.
    fn is_alive(&self) -> HostResult<bool>;

    /// Terminate the process. Stopping an already-exited process succeeds.
    async fn stop(&self, mode: StopMode) -> HostResult<()>;
}

/// Shows a message to whoever is sitting at the machine
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_mode_default() {
        let mode = StopMode::default();
        assert!(matches!(mode, StopMode::Graceful { timeout } if timeout == Duration::from_secs(5)));
    }
}
