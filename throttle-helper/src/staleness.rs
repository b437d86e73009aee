//! Drift between installed helper files and the canonical artifacts.
//!
//! Only the script decides [`InstallationState`]:
//! 1. `NotInstalled` (script missing or unreadable)
//! 2. `InstalledStale` (trimmed content differs from canonical)
//! 3. `InstalledCurrent`
//!
//! [`check`] additionally reports per-artifact digests, including descriptor
//! drift, for display.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use throttle_artifacts::{generate, ArtifactSet};
use throttle_core::{ArtifactKind, DaemonArtifact, HelperConfig, InstallationState};

/// Per-artifact comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStatus {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub present: bool,
    pub current: bool,
    pub expected_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StalenessReport {
    pub state: InstallationState,
    pub artifacts: Vec<ArtifactStatus>,
}

/// `true` only when a script is installed and differs from canonical.
/// A missing script is "not installed", never "stale".
pub fn needs_update(config: &HelperConfig) -> bool {
    installation_state(config).needs_update()
}

/// Recompute the installation state from disk.
pub fn installation_state(config: &HelperConfig) -> InstallationState {
    state_of(&generate(config).script)
}

/// Installation state plus per-artifact digests.
pub fn check(config: &HelperConfig) -> StalenessReport {
    let artifacts = generate(config);
    StalenessReport {
        state: state_of(&artifacts.script),
        artifacts: artifact_statuses(&artifacts),
    }
}

fn state_of(script: &DaemonArtifact) -> InstallationState {
    match read_installed(&script.installed_path) {
        None => InstallationState::NotInstalled,
        Some(installed) if script.matches(&installed) => InstallationState::InstalledCurrent,
        Some(_) => InstallationState::InstalledStale,
    }
}

fn artifact_statuses(artifacts: &ArtifactSet) -> Vec<ArtifactStatus> {
    artifacts
        .iter()
        .map(|artifact| {
            let installed = read_installed(&artifact.installed_path);
            ArtifactStatus {
                kind: artifact.kind,
                path: artifact.installed_path.clone(),
                present: installed.is_some(),
                current: installed
                    .as_deref()
                    .map(|content| artifact.matches(content))
                    .unwrap_or(false),
                expected_sha256: sha256_hex(artifact.canonical_content.trim()),
                installed_sha256: installed.as_deref().map(|c| sha256_hex(c.trim())),
            }
        })
        .collect()
}

/// Installed content, or `None` when missing or unreadable.
pub(crate) fn read_installed(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "installed file unreadable");
            None
        }
    }
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
