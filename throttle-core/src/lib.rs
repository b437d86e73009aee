//! macthrottle core library: domain types, helper configuration, errors.
//!
//! - [`types`]: pressure levels, snapshots, artifacts, installation state
//! - [`config`]: [`HelperConfig`] load / save / validate
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{ElevationMethod, HelperConfig, SensorConfig};
pub use error::ConfigError;
pub use types::{
    ArtifactKind, DaemonArtifact, InstallationState, PressureLevel, PressureSnapshot,
    ServiceLabel, ServiceRegistration,
};
