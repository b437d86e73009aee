//! Error types for throttle-helper.

use std::path::PathBuf;

use thiserror::Error;

use throttle_core::ConfigError;

use crate::plan::Step;

/// Failures of install, update and uninstall.
///
/// None of these are fatal to the controller; every variant carries a
/// diagnostic meant for the operator.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Writing to the scratch location failed. Nothing privileged ran and
    /// no system state changed.
    #[error("failed to stage helper files at {path}: {source}")]
    StagingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operator declined, or the elevation mechanism was unavailable.
    #[error("administrator authorization failed: {diagnostic}")]
    ElevationDenied { diagnostic: String },

    /// A privileged step failed. Steps in `completed` already ran, so the
    /// system may be left partially installed.
    #[error(
        "privileged step '{step}' failed (completed: {}): {diagnostic}",
        describe_steps(.completed)
    )]
    StepFailed {
        step: Step,
        completed: Vec<Step>,
        diagnostic: String,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Querying the service manager (non-privileged) failed.
    #[error("service manager query failed: {0}")]
    ServiceQuery(String),
}

/// Failures reported by an [`Elevator`](crate::elevation::Elevator).
#[derive(Debug, Error)]
pub enum ElevationError {
    #[error("authorization denied: {0}")]
    Denied(String),

    #[error("command sequence failed: {0}")]
    Failed(String),

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn staging_err(path: impl Into<PathBuf>, source: std::io::Error) -> InstallError {
    InstallError::StagingFailed {
        path: path.into(),
        source,
    }
}

fn describe_steps(steps: &[Step]) -> String {
    if steps.is_empty() {
        return "none".to_string();
    }
    steps
        .iter()
        .map(Step::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
