//! labgate - shared lab machine access governance
//!
//! This is the operator-facing entry point. It wires together:
//! - Configuration and roster loading
//! - The SQLite access store
//! - Schedule gating and the audit write path
//! - Session supervision on the Linux host
//! - Violation and usage reports over the raw history

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Local};
use clap::{Parser, Subcommand};
use labgate_config::{load_config, load_roster, Policy};
use labgate_core::{
    AccessCompactor, AccessRecorder, ClosureCause, Gate, MonitorSettings, ScheduleResolver,
    SessionMonitor, UsageSummary, ViolationDetector,
};
use labgate_host_api::{SessionProcess, StopMode};
use labgate_host_linux::{hostname, DesktopNotifier, LinuxSessionProcess};
use labgate_store::{AccessEvent, AccessLog, SqliteStore};
use labgate_util::{
    default_config_path, format_duration, format_log_timestamp, is_mock_time_active, now,
    MachineId, LABGATE_DATA_DIR_ENV, STORE_FILENAME,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// labgate - Schedule-gated access to shared lab machines
#[derive(Parser, Debug)]
#[command(name = "labgate")]
#[command(about = "Schedule-gated access to shared lab machines", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/labgate/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override
    #[arg(short, long, env = LABGATE_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show the machine, the class in session and store health
    Status,

    /// List the accounts that may log in right now
    Roster {
        /// List the whole roster instead
        #[arg(long)]
        all: bool,
    },

    /// Log in as a permitted identity and supervise the session
    Login {
        /// Display name as it appears in the roster
        name: String,
    },

    /// Report machines shared by too many identities
    Violations {
        /// Re-run the scan every N seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Usage summary: active sessions, logins today, busiest machines
    Report {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the compact occupancy trail
    Trail {
        /// Only this machine
        #[arg(short, long)]
        machine: Option<String>,
    },
}

/// Loaded configuration plus the opened store
struct App {
    policy: Policy,
    store: Arc<dyn AccessLog>,
    machine: MachineId,
}

impl App {
    fn open(args: &Args) -> Result<Self> {
        let policy = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            slots = policy.schedule.len(),
            "Configuration loaded"
        );

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| policy.service.data_dir.clone());
        let db_path = data_dir.join(STORE_FILENAME);
        let store: Arc<dyn AccessLog> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        let host = hostname();
        let machine = policy.machines.resolve(&host);
        info!(hostname = %host, machine = %machine, "Machine identified");

        Ok(Self {
            policy,
            store,
            machine,
        })
    }

    fn gate(&self) -> Result<Gate> {
        let roster = load_roster(&self.policy.service.roster_path).with_context(|| {
            format!(
                "Failed to load roster from {:?}",
                self.policy.service.roster_path
            )
        })?;
        info!(identities = roster.len(), "Roster loaded");

        Ok(Gate::new(
            ScheduleResolver::new(self.policy.schedule.clone()),
            roster,
        )?)
    }

    fn history(&self) -> Result<Vec<AccessEvent>> {
        self.store
            .all_events()
            .context("Failed to read access history")
    }

    fn status(&self) -> Result<()> {
        let now = now();
        let gate = self.gate()?;

        println!("Machine:  {}", self.machine);
        println!(
            "Time:     {}{}",
            format_log_timestamp(&now),
            if is_mock_time_active() { " (mock)" } else { "" }
        );
        println!(
            "Store:    {}",
            if self.store.is_healthy() { "healthy" } else { "UNHEALTHY" }
        );

        match gate.permitted(&now) {
            Ok(permit) => println!(
                "Class:    {} ({} identities)",
                permit.slot,
                permit.identities.len()
            ),
            Err(e) => println!("Class:    none ({})", e),
        }

        println!();
        println!("Today's schedule:");
        let mut any = false;
        for slot in gate.resolver().slots_on(now.weekday()) {
            any = true;
            println!("  {}-{}  {}", slot.start, slot.end, slot.class_label());
        }
        if !any {
            println!("  (no classes)");
        }
        Ok(())
    }

    fn roster(&self, all: bool) -> Result<()> {
        let gate = self.gate()?;

        if all {
            for identity in gate.roster().identities() {
                println!(
                    "{}  ({} - {} - {})",
                    identity.display_name, identity.grade, identity.group, identity.school
                );
            }
            return Ok(());
        }

        let permit = gate.permitted(&now())?;
        println!("{}", permit.slot);
        for identity in permit.identities {
            println!("  {}", identity.display_name);
        }
        Ok(())
    }

    async fn login(&self, name: &str) -> Result<()> {
        let now = now();
        let gate = self.gate()?;
        let (slot, identity) = gate.authorize(name, &now)?;

        info!(identity = %identity.display_name, slot = %slot, "Login authorized");

        let event = AccessEvent::new(
            now,
            identity.display_name.as_str(),
            identity.contact_email.as_str(),
            identity.school.as_str(),
            self.machine.clone(),
        );
        let recorder = AccessRecorder::new(
            self.store.clone(),
            AccessCompactor::from_policy(&self.policy.audit),
        );
        let report = recorder.record(&event);
        if !report.event_appended {
            warn!("Access was not written to the history");
        }

        let session = &self.policy.session;
        let extra_env = vec![
            ("LABGATE_IDENTITY".to_string(), identity.display_name.clone()),
            ("LABGATE_EMAIL".to_string(), identity.contact_email.clone()),
            ("LABGATE_MACHINE".to_string(), self.machine.to_string()),
        ];
        let process: Arc<dyn SessionProcess> = Arc::new(
            LinuxSessionProcess::spawn(&session.command, &extra_env)
                .context("Failed to start session process")?,
        );

        let notifier = DesktopNotifier::new();
        let mut monitor = SessionMonitor::new(MonitorSettings::from_policy(session));

        println!(
            "Session started for {} on {} ({})",
            identity.display_name,
            self.machine,
            format_duration(session.duration)
        );

        tokio::select! {
            outcome = monitor.run(process.clone(), &notifier) => {
                let outcome = outcome?;
                println!(
                    "Session {} after {}",
                    outcome.state,
                    format_duration(outcome.elapsed)
                );
                if let Some(ClosureCause::ProbeFailed(reason)) = &outcome.cause {
                    warn!(reason = %reason, "Session probe failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping session");
                process
                    .stop(StopMode::default())
                    .await
                    .context("Failed to stop session process")?;
            }
        }

        Ok(())
    }

    fn violations_once(&self, detector: &ViolationDetector, json: bool) -> Result<()> {
        let violations = detector.detect(&self.history()?);

        if json {
            println!("{}", serde_json::to_string_pretty(&violations)?);
            return Ok(());
        }

        if violations.is_empty() {
            println!("No violations");
            return Ok(());
        }

        for v in &violations {
            println!(
                "{}  {}  {}: {}",
                format_log_timestamp(&v.triggering_event.timestamp),
                v.machine_id,
                v.reason(),
                v.identities.join(", ")
            );
        }
        Ok(())
    }

    async fn violations(&self, watch: Option<u64>, json: bool) -> Result<()> {
        let detector = ViolationDetector::from_policy(&self.policy.violations);

        let Some(secs) = watch else {
            return self.violations_once(&detector, json);
        };
        if secs == 0 {
            bail!("--watch interval must be at least one second");
        }

        self.watch_violations(&detector, Duration::from_secs(secs), json, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
        Ok(())
    }

    /// Rescan every `period` until `shutdown` resolves. A failed scan is
    /// logged and retried on the next tick.
    async fn watch_violations(
        &self,
        detector: &ViolationDetector,
        period: Duration,
        json: bool,
        shutdown: impl Future<Output = ()>,
    ) {
        let mut ticker = tokio::time::interval(period);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !json {
                        println!("--- {}", format_log_timestamp(&now()));
                    }
                    if let Err(e) = self.violations_once(detector, json) {
                        warn!(error = %format!("{:#}", e), "Violation scan failed");
                    }
                }
                _ = &mut shutdown => return,
            }
        }
    }

    fn report(&self, json: bool) -> Result<()> {
        let now: DateTime<Local> = now();
        let active_window = self.policy.session.duration + Duration::from_secs(60);
        let summary = UsageSummary::compute(&self.history()?, now, active_window);

        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("Total logins: {}", summary.total_logins);
        println!("Logins today: {}", summary.logins_today);
        println!();
        println!("Active now:");
        if summary.active_now.is_empty() {
            println!("  (none)");
        }
        for event in &summary.active_now {
            println!(
                "  {}  {}  {}",
                format_log_timestamp(&event.timestamp),
                event.machine_id,
                event.identity_name
            );
        }
        println!();
        println!("Logins per machine:");
        for usage in &summary.per_machine {
            println!("  {:>5}  {}", usage.logins, usage.machine_id);
        }
        Ok(())
    }

    fn trail(&self, machine: Option<String>) -> Result<()> {
        let machine = machine.map(MachineId::new);
        let lines = self
            .store
            .compact_trail(machine.as_ref())
            .context("Failed to read compact trail")?;

        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "labgate starting");

    let app = App::open(&args)?;

    match args.command {
        Cmd::Status => app.status(),
        Cmd::Roster { all } => app.roster(all),
        Cmd::Login { ref name } => app.login(name).await,
        Cmd::Violations { watch, json } => app.violations(watch, json).await,
        Cmd::Report { json } => app.report(json),
        Cmd::Trail { ref machine } => app.trail(machine.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labgate_config::parse_config;
    use labgate_store::{StoreError, StoreResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// History that can never be read
    #[derive(Default)]
    struct UnreadableStore {
        reads: AtomicUsize,
    }

    impl AccessLog for UnreadableStore {
        fn append_event(&self, _: &AccessEvent) -> StoreResult<()> {
            Ok(())
        }
        fn all_events(&self) -> StoreResult<Vec<AccessEvent>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Database("database is locked".into()))
        }
        fn latest_compact_line(&self, _: &MachineId) -> StoreResult<Option<String>> {
            Ok(None)
        }
        fn append_compact_line(&self, _: &MachineId, _: &str) -> StoreResult<()> {
            Ok(())
        }
        fn compact_trail(&self, _: Option<&MachineId>) -> StoreResult<Vec<String>> {
            Ok(Vec::new())
        }
        fn is_healthy(&self) -> bool {
            false
        }
    }

    fn app_with(store: Arc<dyn AccessLog>) -> App {
        let policy = parse_config(
            r#"
            config_version = 1

            [session]
            command = ["firefox"]

            [[schedule]]
            day = "mon"
            start = "08:00"
            end = "09:00"
            school = "Central"
            grade = "5th grade"
            group = "A"
            "#,
        )
        .unwrap();

        App {
            policy,
            store,
            machine: MachineId::new("PC 01"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn watch_keeps_scanning_after_failed_reads() {
        let store = Arc::new(UnreadableStore::default());
        let app = app_with(store.clone());
        let detector = ViolationDetector::default();

        // Ticks at 0s, 10s, 20s, 30s before shutdown at 35s
        app.watch_violations(
            &detector,
            Duration::from_secs(10),
            true,
            tokio::time::sleep(Duration::from_secs(35)),
        )
        .await;

        assert_eq!(store.reads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn single_scan_reports_read_failure() {
        let app = app_with(Arc::new(UnreadableStore::default()));
        assert!(app.violations_once(&ViolationDetector::default(), true).is_err());
    }
}
