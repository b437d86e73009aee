//! One invocation of the sensor-report command.

use std::process::Stdio;

use tokio::process::Command;

use throttle_core::{PressureLevel, SensorConfig};

use crate::classify::classify_report;

/// Result of one sample. Everything but `Reading` is written as `unknown`;
/// the distinction only reaches the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Indicator line found and classified.
    Reading(PressureLevel),
    /// The command ran but its report had no recognizable level.
    Unrecognized,
    /// The command could not be spawned, timed out, or exited non-zero
    /// without an indicator line.
    CommandFailed(String),
}

impl SampleOutcome {
    /// Level written to the state file.
    pub fn level(&self) -> PressureLevel {
        match self {
            SampleOutcome::Reading(level) => *level,
            SampleOutcome::Unrecognized | SampleOutcome::CommandFailed(_) => PressureLevel::Unknown,
        }
    }
}

/// Run the sensor once, bounded by `sensor.timeout()`.
pub async fn sample(sensor: &SensorConfig) -> SampleOutcome {
    let mut command = Command::new(&sensor.program);
    command
        .args(&sensor.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(sensor.timeout(), command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            return SampleOutcome::CommandFailed(format!("{}: {err}", sensor.program));
        }
        Err(_) => {
            return SampleOutcome::CommandFailed(format!(
                "{} timed out after {}s",
                sensor.program, sensor.timeout_secs
            ));
        }
    };

    let report = String::from_utf8_lossy(&output.stdout);
    match classify_report(&report, &sensor.indicator) {
        Some(PressureLevel::Unknown) => SampleOutcome::Unrecognized,
        Some(level) => SampleOutcome::Reading(level),
        None if !output.status.success() => {
            SampleOutcome::CommandFailed(format!("{} exited with {}", sensor.program, output.status))
        }
        None => SampleOutcome::Unrecognized,
    }
}
