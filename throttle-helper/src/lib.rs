//! # throttle-helper
//!
//! Lifecycle of the privileged thermal helper: staleness detection, staging,
//! the privileged install/update/uninstall sequence and the elevation
//! boundary it crosses.
//!
//! Use [`Installer`] for the full flow, or [`needs_update`] /
//! [`installation_state`] to inspect what is on disk without elevating.

pub mod diff;
pub mod elevation;
pub mod error;
pub mod installer;
pub mod plan;
pub mod service;
pub mod staging;
pub mod staleness;

pub use diff::{diff_installed, ArtifactDiff};
pub use elevation::{elevator_for, AppleScriptElevator, DirectElevator, Elevator, SudoElevator};
pub use error::{ElevationError, InstallError};
pub use installer::{Installer, StatusMessage};
pub use plan::{CommandSequence, Plan, Step};
pub use service::ServiceManager;
pub use staleness::{check, installation_state, needs_update, ArtifactStatus, StalenessReport};
