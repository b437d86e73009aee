//! Unified diffs for `macthrottle diff`.

use std::path::PathBuf;

use similar::TextDiff;

use throttle_artifacts::generate;
use throttle_core::{ArtifactKind, HelperConfig};

use crate::staleness::read_installed;

/// A single artifact diff, installed (`a/`) against canonical (`b/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDiff {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Diff every installed artifact against what an update would deploy.
///
/// Artifacts that are not installed or already current are skipped. No files
/// are written.
pub fn diff_installed(config: &HelperConfig) -> Vec<ArtifactDiff> {
    let artifacts = generate(config);
    let mut diffs = Vec::new();
    for artifact in artifacts.iter() {
        let Some(installed) = read_installed(&artifact.installed_path) else {
            continue;
        };
        if artifact.matches(&installed) {
            continue;
        }

        let installed = normalize(&installed);
        let canonical = normalize(&artifact.canonical_content);
        let display = artifact.installed_path.display();
        let old_header = format!("a{display}");
        let new_header = format!("b{display}");
        let unified = TextDiff::from_lines(&installed, &canonical)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(ArtifactDiff {
            kind: artifact.kind,
            path: artifact.installed_path.clone(),
            unified_diff: unified,
        });
    }
    diffs
}

fn normalize(content: &str) -> String {
    format!("{}\n", content.replace("\r\n", "\n").trim())
}
