//! Mock host implementations for testing

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::{HostError, HostResult, Notifier, SessionProcess, StopMode};

/// Mock session process for unit/integration testing.
///
/// Liveness is driven by the tokio clock, so tests can run under paused time.
pub struct MockProcess {
    started: Instant,
    closes_after: Option<Duration>,
    probe_fails_after: Option<Duration>,
    stopped: Mutex<Vec<StopMode>>,

    /// Configure stop to fail
    pub fail_stop: Mutex<bool>,
}

impl MockProcess {
    /// A process that stays alive until stopped
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            closes_after: None,
            probe_fails_after: None,
            stopped: Mutex::new(Vec::new()),
            fail_stop: Mutex::new(false),
        }
    }

    /// Simulate the user closing the window after `delay`
    pub fn closing_after(mut self, delay: Duration) -> Self {
        self.closes_after = Some(delay);
        self
    }

    /// Simulate the probe channel breaking after `delay`
    pub fn probe_failing_after(mut self, delay: Duration) -> Self {
        self.probe_fails_after = Some(delay);
        self
    }

    /// Stop requests received so far
    pub fn stop_requests(&self) -> Vec<StopMode> {
        self.stopped.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn was_stopped(&self) -> bool {
        !self.stop_requests().is_empty()
    }
}

impl Default for MockProcess {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProcess for MockProcess {
    fn describe(&self) -> String {
        "mock process".into()
    }

    fn is_alive(&self) -> HostResult<bool> {
        let elapsed = self.started.elapsed();

        if self.probe_fails_after.is_some_and(|d| elapsed >= d) {
            return Err(HostError::ProbeFailed("mock probe failure".into()));
        }
        if self.was_stopped() {
            return Ok(false);
        }
        Ok(!self.closes_after.is_some_and(|d| elapsed >= d))
    }

    async fn stop(&self, mode: StopMode) -> HostResult<()> {
        if self.fail_stop.lock().map(|f| *f).unwrap_or(false) {
            return Err(HostError::StopFailed("Mock stop failure".into()));
        }
        if let Ok(mut stopped) = self.stopped.lock() {
            stopped.push(mode);
        }
        Ok(())
    }
}

/// Notifier that records what it was asked to show
#[derive(Default)]
pub struct MockNotifier {
    shown: Mutex<Vec<(String, String)>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// (title, message) pairs shown so far
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push((title.to_string(), message.to_string()));
        }
    }
}
