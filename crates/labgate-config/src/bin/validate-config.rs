//! Config validation CLI tool
//!
//! Validates a labgate configuration file (and its roster, if present) and
//! reports any errors.

use labgate_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a labgate configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    let policy = match labgate_config::load_config(&config_path) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                labgate_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                labgate_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        labgate_config::CURRENT_CONFIG_VERSION
                    );
                }
                other => eprintln!("{}", other),
            }
            return ExitCode::from(1);
        }
    };

    println!("✓ Configuration is valid");
    println!();
    println!("Summary:");
    println!("  Config version: {}", labgate_config::CURRENT_CONFIG_VERSION);
    println!("  Session: {:?} (grace {:?})", policy.session.duration, policy.session.grace);
    println!(
        "  Violations: more than {} identities within {:?}",
        policy.violations.max_distinct_identities, policy.violations.window
    );
    println!("  Machine aliases: {}", policy.machines.len());
    println!();
    println!("Schedule:");
    for slot in &policy.schedule {
        println!("  - {}", slot);
    }

    println!();
    match labgate_config::load_roster(&policy.service.roster_path) {
        Ok(roster) => {
            println!("✓ Roster {}: {} identities", policy.service.roster_path.display(), roster.len());
            for slot in &policy.schedule {
                if roster.class_members(&slot.school, &slot.grade, &slot.group).is_empty() {
                    println!("  ! no roster entries for {}", slot.class_label());
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Roster {}: {}", policy.service.roster_path.display(), e);
            ExitCode::from(1)
        }
    }
}
