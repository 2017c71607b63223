//! Process group management

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use tracing::debug;

use labgate_host_api::{HostError, HostResult};

/// Environment variables forwarded from the launcher into the session
const INHERITED_ENV: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LANG",
    "DISPLAY",
    "WAYLAND_DISPLAY",
    "XDG_RUNTIME_DIR",
    "DBUS_SESSION_BUS_ADDRESS",
];

/// Child process that leads its own process group
pub struct ManagedProcess {
    child: Child,
    pub pid: u32,
    pub pgid: u32,
}

impl ManagedProcess {
    /// Spawn `argv` in a new session so the whole group can be signalled at once.
    ///
    /// The environment is cleared apart from [`INHERITED_ENV`] and `extra_env`.
    pub fn spawn(argv: &[String], extra_env: &[(String, String)]) -> HostResult<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(HostError::SpawnFailed("Empty argv".into()));
        };

        let mut cmd = Command::new(program);
        cmd.args(args);

        cmd.env_clear();
        for key in INHERITED_ENV {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }
        for (key, value) in extra_env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        // SAFETY: setsid is async-signal-safe and touches no shared state
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid().map_err(std::io::Error::from)?;
                Ok(())
            });
        }

        let child = cmd
            .spawn()
            .map_err(|e| HostError::SpawnFailed(format!("Failed to spawn {}: {}", program, e)))?;

        let pid = child.id();
        // After setsid, pid == pgid
        let pgid = pid;

        debug!(pid, pgid, program = %program, "Process spawned");

        Ok(Self { child, pid, pgid })
    }

    /// Send SIGTERM to the process group
    pub fn terminate(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGTERM)
    }

    /// Send SIGKILL to the process group
    pub fn kill(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGKILL)
    }

    fn signal_group(&self, sig: Signal) -> HostResult<()> {
        // Negative pid addresses the group
        let group = Pid::from_raw(-(self.pgid as i32));

        match signal::kill(group, sig) {
            Ok(()) => {
                debug!(pgid = self.pgid, signal = %sig, "Signalled process group");
                Ok(())
            }
            // Already gone
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(HostError::StopFailed(format!("Failed to send {}: {}", sig, e))),
        }
    }

    /// Non-blocking exit check. `Some(code)` once exited; signal deaths report -1.
    pub fn try_wait(&mut self) -> HostResult<Option<i32>> {
        match self.child.try_wait() {
            Ok(Some(status)) => Ok(Some(status.code().unwrap_or(-1))),
            Ok(None) => Ok(None),
            Err(e) => Err(HostError::ProbeFailed(format!("Wait failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn wait_for_exit(proc: &mut ManagedProcess) -> Option<i32> {
        for _ in 0..100 {
            if let Some(code) = proc.try_wait().unwrap() {
                return Some(code);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        None
    }

    #[test]
    fn spawn_simple_process() {
        let mut proc = ManagedProcess::spawn(&argv(&["true"]), &[]).unwrap();
        assert_eq!(wait_for_exit(&mut proc), Some(0));
    }

    #[test]
    fn spawn_rejects_empty_argv() {
        assert!(matches!(
            ManagedProcess::spawn(&[], &[]),
            Err(HostError::SpawnFailed(_))
        ));
    }

    #[test]
    fn spawn_missing_program_fails() {
        let result = ManagedProcess::spawn(&argv(&["/nonexistent/labgate-test-binary"]), &[]);
        assert!(matches!(result, Err(HostError::SpawnFailed(_))));
    }

    #[test]
    fn terminate_sleeping_process() {
        let mut proc = ManagedProcess::spawn(&argv(&["sleep", "60"]), &[]).unwrap();
        assert_eq!(proc.try_wait().unwrap(), None);

        proc.terminate().unwrap();
        assert_eq!(wait_for_exit(&mut proc), Some(-1));

        // Signalling a reaped group is not an error
        proc.kill().unwrap();
    }
}
