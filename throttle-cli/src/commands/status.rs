//! `macthrottle status`: installation state, artifact drift and the latest
//! pressure snapshot.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use throttle_core::{HelperConfig, InstallationState, PressureLevel, PressureSnapshot};
use throttle_helper::{check, ArtifactStatus, ServiceManager};
use throttle_sampler::{format_age, read_snapshot};

use super::load_config;

/// Arguments for `macthrottle status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let config = load_config(explicit)?;
        let report = build_report(&config);
        if self.json {
            print_json(&report)?;
            return Ok(());
        }
        print_table(&config, report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    label: String,
    state: InstallationState,
    needs_update: bool,
    /// `None` when the service manager could not be queried.
    registered: Option<bool>,
    artifacts: Vec<ArtifactStatus>,
    snapshot: Option<SnapshotJson>,
}

#[derive(Debug, Serialize)]
struct SnapshotJson {
    pressure: PressureLevel,
    throttling: bool,
    timestamp: i64,
    observed_at: Option<String>,
    age: String,
}

#[derive(Tabled)]
struct ArtifactRow {
    #[tabled(rename = "artifact")]
    artifact: String,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "installed sha256")]
    installed: String,
}

fn build_report(config: &HelperConfig) -> StatusReport {
    let staleness = check(config);
    let registered = ServiceManager::from_config(config)
        .is_registered(&config.label)
        .ok();
    let snapshot = read_snapshot(&config.state_file).map(|s| snapshot_json(&s));

    StatusReport {
        label: config.label.to_string(),
        needs_update: staleness.state.needs_update(),
        state: staleness.state,
        registered,
        artifacts: staleness.artifacts,
        snapshot,
    }
}

fn snapshot_json(snapshot: &PressureSnapshot) -> SnapshotJson {
    SnapshotJson {
        pressure: snapshot.pressure,
        throttling: snapshot.pressure.is_throttling(),
        timestamp: snapshot.timestamp,
        observed_at: snapshot.observed_at().map(|t| t.to_rfc3339()),
        age: format_age(snapshot, Utc::now()),
    }
}

fn print_json(report: &StatusReport) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(config: &HelperConfig, report: StatusReport) {
    println!(
        "macthrottle v{} | {} | {}",
        env!("CARGO_PKG_VERSION"),
        report.label,
        state_label(report.state),
    );

    let separator = "■".repeat(67).bright_black().to_string();
    println!("{separator}");

    let rows: Vec<ArtifactRow> = report
        .artifacts
        .iter()
        .map(|status| ArtifactRow {
            artifact: status.kind.to_string(),
            path: status.path.display().to_string(),
            status: artifact_label(status),
            installed: status
                .installed_sha256
                .as_deref()
                .map(short_digest)
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{separator}");

    let registration = match report.registered {
        Some(true) => "registered".green().to_string(),
        Some(false) => "not registered".red().to_string(),
        None => "unknown (service manager unavailable)".bright_black().to_string(),
    };
    println!("Daemon:   {registration}");

    match &report.snapshot {
        Some(snapshot) => println!(
            "Pressure: {} ({} ago, {})",
            pressure_label(snapshot.pressure),
            snapshot.age,
            config.state_file.display()
        ),
        None => println!(
            "Pressure: {} ({})",
            "no data".bright_black(),
            config.state_file.display()
        ),
    }

    match report.state {
        InstallationState::NotInstalled => println!("Run 'macthrottle install' to set up the helper."),
        InstallationState::InstalledStale => {
            println!("Run 'macthrottle update' to replace the installed helper.")
        }
        InstallationState::InstalledCurrent => {}
    }
}

fn state_label(state: InstallationState) -> String {
    match state {
        InstallationState::NotInstalled => "NOT INSTALLED".bright_black().bold().to_string(),
        InstallationState::InstalledCurrent => "CURRENT".green().bold().to_string(),
        InstallationState::InstalledStale => "STALE".yellow().bold().to_string(),
    }
}

fn artifact_label(status: &ArtifactStatus) -> String {
    match (status.present, status.current) {
        (false, _) => "MISSING".to_string(),
        (true, true) => "CURRENT".to_string(),
        (true, false) => "MODIFIED".to_string(),
    }
}

fn pressure_label(level: PressureLevel) -> String {
    let label = level.as_str().to_uppercase();
    if level.is_throttling() {
        return label.red().bold().to_string();
    }
    match level {
        PressureLevel::Nominal => label.green().to_string(),
        PressureLevel::Moderate => label.yellow().to_string(),
        _ => label.bright_black().to_string(),
    }
}

fn short_digest(digest: &str) -> String {
    digest.chars().take(12).collect()
}
