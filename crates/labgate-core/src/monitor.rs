//! Session supervision
//!
//! A session runs `Idle -> Active -> {TimedOut | ExternallyClosed}`. While
//! active, a poller task probes the external process at a fixed interval and
//! the monitor waits on the deadline timer. Whichever fires first decides the
//! terminal state; the cancellation token stops the poller when the deadline
//! wins.

use labgate_config::SessionPolicy;
use labgate_host_api::{Notifier, SessionProcess, StopMode};
use labgate_util::{format_duration, LabgateError, Result, SessionId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Monitor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Active,
    TimedOut,
    ExternallyClosed,
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TimedOut | Self::ExternallyClosed)
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::TimedOut => "timed out",
            Self::ExternallyClosed => "externally closed",
        };
        f.write_str(s)
    }
}

/// Why a session ended before its budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureCause {
    /// Liveness probe reported the process gone
    ProcessGone,
    /// Liveness probe itself failed
    ProbeFailed(String),
}

/// Timing and messages for one supervised session
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub budget: Duration,
    pub grace: Duration,
    pub poll_interval: Duration,
    pub warning_title: String,
    pub warning_message: String,
}

impl MonitorSettings {
    pub fn from_policy(policy: &SessionPolicy) -> Self {
        Self {
            budget: policy.duration,
            grace: policy.grace,
            poll_interval: policy.poll_interval,
            warning_title: policy.warning_title.clone(),
            warning_message: policy.warning_message.clone(),
        }
    }
}

/// How a supervised session ended
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session_id: SessionId,
    /// Always terminal
    pub state: MonitorState,
    /// Time from activation to entering the terminal state
    pub elapsed: Duration,
    /// Set for `ExternallyClosed`
    pub cause: Option<ClosureCause>,
}

/// Supervises a single session. One shot: once it has left `Idle` it will
/// not run again.
pub struct SessionMonitor {
    settings: MonitorSettings,
    session_id: SessionId,
    state: MonitorState,
}

impl SessionMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            settings,
            session_id: SessionId::new(),
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Supervise `process` until its budget runs out or it goes away
    pub async fn run(
        &mut self,
        process: Arc<dyn SessionProcess>,
        notifier: &dyn Notifier,
    ) -> Result<SessionOutcome> {
        if self.state != MonitorState::Idle {
            return Err(LabgateError::SessionAlreadyStarted);
        }

        self.state = MonitorState::Active;
        let started = Instant::now();
        let deadline = started.checked_add(self.settings.budget);

        info!(
            session_id = %self.session_id,
            process = %process.describe(),
            budget = %format_duration(self.settings.budget),
            "Session active"
        );

        let token = CancellationToken::new();
        let mut poller = tokio::spawn(watch_liveness(
            process.clone(),
            self.settings.poll_interval,
            token.clone(),
        ));

        let closure = tokio::select! {
            joined = &mut poller => Some(match joined {
                Ok(Some(cause)) => cause,
                Ok(None) => ClosureCause::ProbeFailed("liveness poller cancelled".into()),
                Err(e) => ClosureCause::ProbeFailed(format!("liveness poller failed: {}", e)),
            }),
            _ = budget_exhausted(deadline) => None,
        };

        let elapsed = started.elapsed();

        let outcome = match closure {
            Some(cause) => {
                self.state = MonitorState::ExternallyClosed;
                info!(
                    session_id = %self.session_id,
                    cause = ?cause,
                    elapsed = %format_duration(elapsed),
                    "Session closed externally"
                );

                // Reap anything left in the process group
                if let Err(e) = process.stop(StopMode::Force).await {
                    debug!(session_id = %self.session_id, error = %e, "Cleanup stop failed");
                }

                SessionOutcome {
                    session_id: self.session_id.clone(),
                    state: self.state,
                    elapsed,
                    cause: Some(cause),
                }
            }
            None => {
                token.cancel();
                self.state = MonitorState::TimedOut;
                info!(
                    session_id = %self.session_id,
                    elapsed = %format_duration(elapsed),
                    "Session budget exhausted"
                );

                notifier.notify(&self.settings.warning_title, &self.settings.warning_message);
                tokio::time::sleep(self.settings.grace).await;

                if let Err(e) = process.stop(StopMode::Force).await {
                    warn!(session_id = %self.session_id, error = %e, "Failed to stop session process");
                }

                SessionOutcome {
                    session_id: self.session_id.clone(),
                    state: self.state,
                    elapsed,
                    cause: None,
                }
            }
        };

        Ok(outcome)
    }
}

/// Resolves at `deadline`; a budget too large for the clock never runs out.
async fn budget_exhausted(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Probe until the process is gone (or the probe fails). Returns `None` if
/// cancelled first.
async fn watch_liveness(
    process: Arc<dyn SessionProcess>,
    interval: Duration,
    token: CancellationToken,
) -> Option<ClosureCause> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => return None,
            _ = ticker.tick() => {}
        }

        match process.is_alive() {
            Ok(true) => {}
            Ok(false) => return Some(ClosureCause::ProcessGone),
            Err(e) => {
                warn!(error = %e, "Liveness probe failed");
                return Some(ClosureCause::ProbeFailed(e.to_string()));
            }
        }
    }
}
