//! # throttle-artifacts
//!
//! Canonical text of the two files the helper deploys: the daemon script and
//! its launchd descriptor. Generation is a pure function of [`HelperConfig`];
//! no I/O happens here.
//!
//! ```rust
//! use throttle_artifacts::generate;
//! use throttle_core::{ArtifactKind, HelperConfig};
//!
//! let artifacts = generate(&HelperConfig::default());
//! assert_eq!(artifacts.get(ArtifactKind::Script).kind, ArtifactKind::Script);
//! ```

pub mod descriptor;
pub mod script;
pub mod shell;

use throttle_core::{ArtifactKind, DaemonArtifact, HelperConfig};

pub use descriptor::{generate_descriptor, render_registration};
pub use script::generate_script;

/// Script and descriptor generated together for one install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub script: DaemonArtifact,
    pub descriptor: DaemonArtifact,
}

impl ArtifactSet {
    pub fn get(&self, kind: ArtifactKind) -> &DaemonArtifact {
        match kind {
            ArtifactKind::Script => &self.script,
            ArtifactKind::ServiceDescriptor => &self.descriptor,
        }
    }

    /// Script first, then descriptor (deployment order).
    pub fn iter(&self) -> impl Iterator<Item = &DaemonArtifact> {
        [&self.script, &self.descriptor].into_iter()
    }
}

/// Generate both artifacts for `config`.
pub fn generate(config: &HelperConfig) -> ArtifactSet {
    ArtifactSet {
        script: DaemonArtifact {
            kind: ArtifactKind::Script,
            canonical_content: generate_script(config),
            installed_path: config.script_path.clone(),
        },
        descriptor: DaemonArtifact {
            kind: ArtifactKind::ServiceDescriptor,
            canonical_content: generate_descriptor(config),
            installed_path: config.descriptor_path(),
        },
    }
}
