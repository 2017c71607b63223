//! Linux host adapter implementation

use async_trait::async_trait;
use labgate_host_api::{HostError, HostResult, Notifier, SessionProcess, StopMode};
use std::process::{Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::process::ManagedProcess;

/// Hostname reported when the OS lookup fails
pub const UNKNOWN_HOST: &str = "unknown-host";

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Session process running on this machine
pub struct LinuxSessionProcess {
    process: Mutex<ManagedProcess>,
    pid: u32,
}

impl LinuxSessionProcess {
    /// Launch the session command with `extra_env` on top of the inherited environment
    pub fn spawn(argv: &[String], extra_env: &[(String, String)]) -> HostResult<Self> {
        let process = ManagedProcess::spawn(argv, extra_env)?;
        let pid = process.pid;
        info!(pid, command = ?argv, "Session process started");

        Ok(Self {
            process: Mutex::new(process),
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    fn process(&self) -> HostResult<MutexGuard<'_, ManagedProcess>> {
        self.process
            .lock()
            .map_err(|_| HostError::Internal("process lock poisoned".into()))
    }

    fn has_exited(&self) -> HostResult<bool> {
        Ok(self.process()?.try_wait()?.is_some())
    }
}

#[async_trait]
impl SessionProcess for LinuxSessionProcess {
    fn describe(&self) -> String {
        format!("pid {}", self.pid)
    }

    fn is_alive(&self) -> HostResult<bool> {
        let exit = self.process()?.try_wait()?;
        if let Some(code) = exit {
            debug!(pid = self.pid, code, "Session process has exited");
        }
        Ok(exit.is_none())
    }

    async fn stop(&self, mode: StopMode) -> HostResult<()> {
        if self.has_exited()? {
            return Ok(());
        }

        match mode {
            StopMode::Graceful { timeout } => {
                self.process()?.terminate()?;
                info!(pid = self.pid, "Sent SIGTERM to session");

                let start = tokio::time::Instant::now();
                while start.elapsed() < timeout {
                    tokio::time::sleep(STOP_POLL_INTERVAL).await;
                    if self.has_exited()? {
                        return Ok(());
                    }
                }

                warn!(pid = self.pid, "Session ignored SIGTERM, sending SIGKILL");
                self.process()?.kill()
            }
            StopMode::Force => {
                info!(pid = self.pid, "Sending SIGKILL to session");
                self.process()?.kill()
            }
        }
    }
}

/// Name of this machine as the OS reports it, or [`UNKNOWN_HOST`]
pub fn hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => match name.into_string() {
            Ok(name) if !name.is_empty() => name,
            _ => {
                warn!("Hostname is empty or not valid UTF-8");
                UNKNOWN_HOST.to_string()
            }
        },
        Err(e) => {
            warn!(error = %e, "Failed to read hostname");
            UNKNOWN_HOST.to_string()
        }
    }
}

/// Desktop notifications via `notify-send`.
///
/// The notifier process is started and left to finish on its own; a stalled
/// notification daemon never holds up the caller.
pub struct DesktopNotifier {
    program: String,
    base_args: Vec<String>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            program: "notify-send".into(),
            base_args: vec!["--urgency=critical".into()],
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let spawned = Command::new(&self.program)
            .args(&self.base_args)
            .args([title, message])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!(title, error = %e, program = %self.program, "Failed to run notifier");
                return;
            }
        };

        // Reap off the caller's thread
        let title = title.to_string();
        std::thread::spawn(move || match child.wait() {
            Ok(s) if s.success() => debug!(title = %title, "Notification shown"),
            Ok(s) => warn!(title = %title, status = %s, "Notifier exited with failure"),
            Err(e) => warn!(title = %title, error = %e, "Failed to wait for notifier"),
        });
    }
}
