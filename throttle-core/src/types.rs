//! Domain types for the macthrottle helper.
//!
//! Path fields use `PathBuf`; the snapshot wire format is owned by
//! [`PressureSnapshot`] and must stay `{"pressure": "...", "timestamp": N}`.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Service-manager label (reverse-DNS), unique per registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceLabel(pub String);

impl fmt::Display for ServiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ServiceLabel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServiceLabel {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Pressure
// ---------------------------------------------------------------------------

/// Thermal pressure classification written by the sampling daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    Nominal,
    Moderate,
    Heavy,
    Trapping,
    Sleeping,
    Unknown,
}

impl PressureLevel {
    /// Keyword match order. The first level whose keyword appears in the
    /// indicator line wins; nothing matching means [`PressureLevel::Unknown`].
    pub const PRIORITY: [PressureLevel; 5] = [
        PressureLevel::Sleeping,
        PressureLevel::Trapping,
        PressureLevel::Heavy,
        PressureLevel::Moderate,
        PressureLevel::Nominal,
    ];

    /// Lowercase label used on the wire and as the classification keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            PressureLevel::Nominal => "nominal",
            PressureLevel::Moderate => "moderate",
            PressureLevel::Heavy => "heavy",
            PressureLevel::Trapping => "trapping",
            PressureLevel::Sleeping => "sleeping",
            PressureLevel::Unknown => "unknown",
        }
    }

    /// `heavy`, `trapping` and `sleeping` mean the host is throttling.
    pub fn is_throttling(self) -> bool {
        matches!(
            self,
            PressureLevel::Heavy | PressureLevel::Trapping | PressureLevel::Sleeping
        )
    }
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sample as persisted in the state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureSnapshot {
    pub pressure: PressureLevel,
    /// Unix epoch seconds at which the sample was taken.
    pub timestamp: i64,
}

impl PressureSnapshot {
    pub fn new(pressure: PressureLevel, timestamp: i64) -> Self {
        Self {
            pressure,
            timestamp,
        }
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

// ---------------------------------------------------------------------------
// Artifacts and registration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Script,
    ServiceDescriptor,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Script => write!(f, "script"),
            ArtifactKind::ServiceDescriptor => write!(f, "service descriptor"),
        }
    }
}

/// A generated file together with the location it is deployed to.
///
/// Identity is `installed_path`. An installed copy is current when it equals
/// `canonical_content` after trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonArtifact {
    pub kind: ArtifactKind,
    pub canonical_content: String,
    pub installed_path: PathBuf,
}

impl DaemonArtifact {
    pub fn matches(&self, installed: &str) -> bool {
        installed.trim() == self.canonical_content.trim()
    }
}

/// The service manager's record for the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    pub label: ServiceLabel,
    pub program_path: PathBuf,
    pub run_at_load: bool,
    pub keep_alive: bool,
}

/// Derived from the installed script on every query; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationState {
    NotInstalled,
    InstalledCurrent,
    InstalledStale,
}

impl InstallationState {
    pub fn needs_update(self) -> bool {
        self == InstallationState::InstalledStale
    }

    pub fn is_installed(self) -> bool {
        self != InstallationState::NotInstalled
    }
}

impl fmt::Display for InstallationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallationState::NotInstalled => write!(f, "not installed"),
            InstallationState::InstalledCurrent => write!(f, "installed (current)"),
            InstallationState::InstalledStale => write!(f, "installed (update available)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
