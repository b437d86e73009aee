//! Install, update and uninstall through a single elevation request each.
//!
//! ## `install` protocol
//!
//! 1. Validate the config and generate both artifacts.
//! 2. Stage them into a fresh scratch directory (no privileges). Any failure
//!    here is [`InstallError::StagingFailed`] and nothing else runs.
//! 3. Render the [`Plan`] and hand it to the [`Elevator`] once.
//! 4. On failure, read the step journal to report which step failed and
//!    which ones already ran. There is no rollback.

use std::fmt;

use throttle_artifacts::generate;
use throttle_core::{HelperConfig, InstallationState};

use crate::elevation::{elevator_for, Elevator};
use crate::error::{ElevationError, InstallError};
use crate::plan::Plan;
use crate::staging::Scratch;
use crate::staleness;

/// Successful outcome of an install, update or uninstall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    Installed,
    Updated,
    Uninstalled,
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::Installed => write!(f, "Helper installed"),
            StatusMessage::Updated => write!(f, "Helper updated"),
            StatusMessage::Uninstalled => write!(f, "Helper uninstalled"),
        }
    }
}

/// Drives the helper lifecycle for one configuration.
///
/// Not safe to run concurrently with another installer touching the same
/// paths; overlapping privileged sequences interleave at the shell level.
pub struct Installer<E> {
    config: HelperConfig,
    elevator: E,
}

impl Installer<Box<dyn Elevator>> {
    /// Installer using the elevation method named in `config`.
    pub fn from_config(config: HelperConfig) -> Self {
        let elevator = elevator_for(config.elevation);
        Self::new(config, elevator)
    }
}

impl<E: Elevator> Installer<E> {
    pub fn new(config: HelperConfig, elevator: E) -> Self {
        Self { config, elevator }
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    pub fn state(&self) -> InstallationState {
        staleness::installation_state(&self.config)
    }

    pub fn needs_update(&self) -> bool {
        staleness::needs_update(&self.config)
    }

    /// Deploy script and descriptor and register the service. With
    /// `force_replace` the existing registration is unloaded first.
    pub fn install(&self, force_replace: bool) -> Result<StatusMessage, InstallError> {
        self.config.validate()?;
        let artifacts = generate(&self.config);

        tracing::info!(
            label = %self.config.label,
            force_replace,
            "staging helper artifacts"
        );
        let scratch = Scratch::create(&self.config.staging_root)?;
        let staged_script = scratch.stage(&artifacts.script)?;
        let staged_descriptor = scratch.stage(&artifacts.descriptor)?;

        let plan = Plan::install(
            &self.config,
            &staged_script,
            &staged_descriptor,
            force_replace,
        );
        self.execute(&plan, &scratch)?;

        Ok(if force_replace {
            StatusMessage::Updated
        } else {
            StatusMessage::Installed
        })
    }

    /// Deregister the service and remove descriptor, script and state file.
    /// Succeeds when nothing is installed.
    pub fn uninstall(&self) -> Result<StatusMessage, InstallError> {
        self.config.validate()?;
        let scratch = Scratch::create(&self.config.staging_root)?;
        let plan = Plan::uninstall(&self.config);
        self.execute(&plan, &scratch)?;
        Ok(StatusMessage::Uninstalled)
    }

    fn execute(&self, plan: &Plan, scratch: &Scratch) -> Result<(), InstallError> {
        let sequence = plan.render(scratch.journal_path());
        tracing::info!(
            elevator = self.elevator.name(),
            steps = ?plan.step_names(),
            "running privileged sequence"
        );

        match self.elevator.run_elevated(&sequence) {
            Ok(()) => {
                tracing::info!(label = %self.config.label, "privileged sequence completed");
                Ok(())
            }
            Err(ElevationError::Denied(diagnostic)) => {
                tracing::warn!(%diagnostic, "elevation denied");
                Err(InstallError::ElevationDenied { diagnostic })
            }
            Err(err @ ElevationError::Spawn { .. }) => {
                tracing::warn!(error = %err, "elevation mechanism unavailable");
                Err(InstallError::ElevationDenied {
                    diagnostic: err.to_string(),
                })
            }
            Err(ElevationError::Failed(diagnostic)) => {
                let completed = scratch.completed_steps();
                let step = plan
                    .first_incomplete(&completed)
                    .unwrap_or_else(|| plan.final_step());
                tracing::error!(
                    step = %step,
                    completed = ?completed,
                    %diagnostic,
                    "privileged step failed; helper may be partially installed"
                );
                Err(InstallError::StepFailed {
                    step,
                    completed,
                    diagnostic,
                })
            }
        }
    }
}
